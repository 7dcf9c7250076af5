//! Door service: the hexagonal core.
//!
//! [`DoorService`] owns the transition table, the current state and the
//! output lines.  All I/O flows through the [`PinPort`] and [`EventSink`]
//! it is built with, making the whole state machine testable with a
//! simulated pin bank.
//!
//! ```text
//!  PinPort (inputs) ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                       │       DoorService         │
//! PinPort (outputs) ◀── │  table · state · outputs  │
//!                       └──────────────────────────┘
//! ```
//!
//! The service is not thread-safe by itself; [`SharedDoor`](super::shared::SharedDoor)
//! serialises access to it.  The jam-recovery pulse is split into
//! [`begin_recovery_pulse`](DoorService::begin_recovery_pulse) and
//! [`finish_recovery_pulse`](DoorService::finish_recovery_pulse) so the
//! caller can wait without holding the lock.

use std::collections::VecDeque;

use log::{debug, error, info, warn};

use crate::fsm::context::{Direction, InputLevels, InputLine, OutputLevels, OutputLine};
use crate::fsm::{DoorEvent, DoorState, Operation, TransitionTable};

use super::events::{AppEvent, StatusRecord};
use super::ports::{EventSink, PinPort};

/// Proof that a recovery pulse is in progress.  Only
/// [`DoorService::begin_recovery_pulse`] hands these out.
#[derive(Debug)]
#[must_use = "a started recovery pulse must be finished"]
pub struct RecoveryPulse {
    _private: (),
}

/// Work queued while a recovery pulse owns the actuators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    Event(DoorEvent),
    Stop,
}

/// Result of feeding one event into the state machine.
#[derive(Debug)]
pub enum Dispatch {
    /// The mapped operation (or no-op) ran to completion.
    Done,
    /// A recovery pulse is in progress and the event was queued.
    Deferred,
    /// `err_close` started a pulse; the caller must wait, then finish it.
    Pulse(RecoveryPulse),
}

pub struct DoorService<P: PinPort, S: EventSink> {
    pins: P,
    sink: S,
    table: TransitionTable,
    state: DoorState,
    outputs: OutputLevels,
    pulse_active: bool,
    deferred: VecDeque<Deferred>,
}

impl<P: PinPort, S: EventSink> DoorService<P, S> {
    /// Construct the service.  State stays `Unknown` until [`start`](Self::start).
    pub fn new(pins: P, sink: S) -> Self {
        Self {
            pins,
            sink,
            table: TransitionTable::default(),
            state: DoorState::Unknown,
            outputs: OutputLevels::all_off(),
            pulse_active: false,
            deferred: VecDeque::new(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// De-energise the outputs and derive the resting state from the
    /// limit switches.  Handles a restart with the door mid-travel.
    pub fn start(&mut self) {
        self.cut_outputs();
        self.reset_state();
        self.sink.emit(&AppEvent::Started(self.state));
        info!("Door service started in {}", self.state);
    }

    /// Drop both outputs for process exit.  Queued work is discarded.
    pub fn shutdown(&mut self) {
        self.deferred.clear();
        self.pulse_active = false;
        self.cut_outputs();
        self.sink.emit(&AppEvent::ShutDown);
        info!("Door service shut down, outputs released");
    }

    // ── Event entry point ─────────────────────────────────────

    /// Run the operation mapped for `event` in the current state.
    pub fn dispatch(&mut self, event: DoorEvent) -> Dispatch {
        debug!("event dispatch: {} in {}", event, self.state);
        if self.pulse_active {
            info!("Recovery pulse active, deferring '{}'", event);
            self.deferred.push_back(Deferred::Event(event));
            self.sink.emit(&AppEvent::EventDeferred(event));
            return Dispatch::Deferred;
        }

        match self.table.lookup(self.state, event) {
            None => {
                debug!("'{}' is a no-op in {}", event, self.state);
                self.sink.emit(&AppEvent::EventIgnored {
                    state: self.state,
                    event,
                });
            }
            Some(Operation::Open) => {
                self.open();
            }
            Some(Operation::Close) => {
                self.close();
            }
            Some(Operation::Stop) => {
                self.stop();
            }
            Some(Operation::Error) => self.error(),
            Some(Operation::ErrClose) => {
                if let Some(pulse) = self.begin_recovery_pulse() {
                    return Dispatch::Pulse(pulse);
                }
            }
        }
        Dispatch::Done
    }

    // ── Operations ────────────────────────────────────────────

    /// Whether the current state has a handler for `event`.
    pub fn permit(&self, event: DoorEvent) -> bool {
        self.table.permits(self.state, event)
    }

    /// Start raising the door.  Returns `false` if not permitted.
    pub fn open(&mut self) -> bool {
        debug!("command: open");
        if self.pulse_active || !self.permit(DoorEvent::Up) {
            return false;
        }
        info!("Opening");
        self.set_direction(Direction::Up);
        self.set_power(true);
        self.set_state(DoorState::Opening);
        true
    }

    /// Start lowering the door.  Returns `false` if not permitted.
    pub fn close(&mut self) -> bool {
        debug!("command: close");
        if self.pulse_active || !self.permit(DoorEvent::Down) {
            return false;
        }
        info!("Closing");
        self.set_direction(Direction::Down);
        self.set_power(true);
        self.set_state(DoorState::Closing);
        true
    }

    /// Cut power, release the relay and settle into the resting state
    /// implied by the limit switches.  Always succeeds; during a recovery
    /// pulse it is queued and applied when the pulse ends.
    pub fn stop(&mut self) -> bool {
        if self.pulse_active {
            info!("Recovery pulse active, deferring stop");
            self.deferred.push_back(Deferred::Stop);
            return true;
        }
        info!("Stopping");
        self.cut_outputs();
        self.reset_state();
        true
    }

    /// Jam signature: closing, yet the upper limit fired.  Immediate
    /// power cut, no permission check.
    pub fn error(&mut self) {
        error!("Jam detected while closing, cutting power");
        self.cut_outputs();
        self.set_state(DoorState::Error);
        self.sink.emit(&AppEvent::JamDetected);
    }

    /// Recompute the resting state from the limit switches.
    pub fn reset_state(&mut self) {
        let next = if self.read_input(InputLine::Upper) {
            DoorState::Open
        } else if self.read_input(InputLine::Lower) {
            DoorState::Closed
        } else {
            DoorState::Stopped
        };
        self.set_state(next);
    }

    /// First half of `err_close`: reverse briefly toward `up`.
    ///
    /// Returns `None` unless the door is in `Error`.  While the returned
    /// pulse is outstanding, `open`/`close` are refused and events and
    /// `stop` are queued.
    pub fn begin_recovery_pulse(&mut self) -> Option<RecoveryPulse> {
        if self.state != DoorState::Error || self.pulse_active {
            return None;
        }
        warn!("Error state, attempting recovery pulse");
        self.pulse_active = true;
        self.set_direction(Direction::Up);
        self.set_power(true);
        Some(RecoveryPulse { _private: () })
    }

    /// Second half of `err_close`: stop the pulse and decide.
    ///
    /// Upper limit still closed: the jam persists and the door goes
    /// `Dead`.  Otherwise the door enters `ErrorRecovery` and closing
    /// power is re-applied; either limit switch will stop it.
    ///
    /// Returns whether the close resumed, plus a new pulse if replaying
    /// queued events started one.
    pub fn finish_recovery_pulse(&mut self, pulse: RecoveryPulse) -> (bool, Option<RecoveryPulse>) {
        let RecoveryPulse { .. } = pulse;
        self.set_power(false);

        let resumed = if self.read_input(InputLine::Upper) {
            error!("Still jammed after recovery pulse, giving up");
            self.set_direction(Direction::Off);
            self.set_state(DoorState::Dead);
            self.sink.emit(&AppEvent::RecoveryFailed);
            false
        } else {
            info!("Unjammed, resuming close");
            self.set_state(DoorState::ErrorRecovery);
            self.set_direction(Direction::Down);
            self.set_power(true);
            self.sink.emit(&AppEvent::JamCleared);
            true
        };
        self.pulse_active = false;

        (resumed, self.replay_deferred())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> DoorState {
        self.state
    }

    pub fn outputs(&self) -> OutputLevels {
        self.outputs
    }

    pub fn is_pulse_active(&self) -> bool {
        self.pulse_active
    }

    /// Sample one input.  A failed read counts as "not high".
    pub fn read_input(&mut self, line: InputLine) -> bool {
        match self.pins.read(line) {
            Ok(level) => level,
            Err(e) => {
                warn!("Input read failed ({}), treating as low", e);
                false
            }
        }
    }

    pub fn inputs(&mut self) -> InputLevels {
        let mut levels = InputLevels::default();
        for line in InputLine::ALL {
            levels.set(line, self.read_input(line));
        }
        levels
    }

    /// State name plus the live level of every input.
    pub fn status(&mut self) -> StatusRecord {
        StatusRecord {
            state: self.state,
            inputs: self.inputs(),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn replay_deferred(&mut self) -> Option<RecoveryPulse> {
        while let Some(item) = self.deferred.pop_front() {
            let outcome = match item {
                Deferred::Stop => {
                    self.stop();
                    Dispatch::Done
                }
                Deferred::Event(event) => self.dispatch(event),
            };
            if let Dispatch::Pulse(pulse) = outcome {
                return Some(pulse);
            }
        }
        None
    }

    fn cut_outputs(&mut self) {
        self.set_power(false);
        self.set_direction(Direction::Off);
    }

    fn set_state(&mut self, next: DoorState) {
        let prev = self.state;
        self.state = next;
        if prev != next {
            self.sink.emit(&AppEvent::StateChanged {
                from: prev,
                to: next,
            });
        }
    }

    fn set_power(&mut self, on: bool) {
        debug!("setting power {}", on);
        self.outputs.power = on;
        if let Err(e) = self.pins.write(OutputLine::Power, on) {
            error!("Power write failed: {}", e);
        }
    }

    fn set_direction(&mut self, direction: Direction) {
        debug!("setting direction {:?}", direction);
        self.outputs.direction = direction;
        if let Err(e) = self.pins.write(OutputLine::Direction, direction.relay_level()) {
            error!("Direction write failed: {}", e);
        }
    }
}
