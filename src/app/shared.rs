//! Serialised access to the door for the edge and command threads.
//!
//! [`SharedDoor`] wraps the [`DoorService`] and the listener registry in
//! separate mutexes.  Every transition and every command runs under the
//! door lock, so two stimuli can never interleave.  The only operation
//! that waits is the jam-recovery pulse; it releases the lock for the
//! duration (see [`DoorService::begin_recovery_pulse`]) and the service
//! itself queues whatever arrives meanwhile.
//!
//! Lock order is door, then listeners.  Pushes to listeners always run
//! with the door lock released.

use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::debug;

use crate::fsm::{DoorEvent, DoorState};
use crate::fsm::context::InputLine;
use crate::rpc::broadcast::{BroadcastRegistry, ConnectionId, Subscriber};

use super::commands::{Command, CommandOutcome};
use super::events::StatusRecord;
use super::ports::{EventSink, PinPort};
use super::service::{Dispatch, DoorService, RecoveryPulse};

pub struct SharedDoor<P: PinPort, S: EventSink> {
    core: Mutex<DoorService<P, S>>,
    listeners: Mutex<BroadcastRegistry>,
    recovery_pulse: Duration,
}

impl<P: PinPort, S: EventSink> SharedDoor<P, S> {
    /// Wrap an already started service.
    pub fn new(service: DoorService<P, S>, recovery_pulse: Duration) -> Self {
        Self {
            core: Mutex::new(service),
            listeners: Mutex::new(BroadcastRegistry::new()),
            recovery_pulse,
        }
    }

    /// Build and start a service on `pins`.
    pub fn start(pins: P, sink: S, recovery_pulse: Duration) -> Self {
        let mut service = DoorService::new(pins, sink);
        service.start();
        Self::new(service, recovery_pulse)
    }

    // A panic while holding a lock leaves plain data behind; keep going.
    fn core(&self) -> MutexGuard<'_, DoorService<P, S>> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> MutexGuard<'_, BroadcastRegistry> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Events ────────────────────────────────────────────────

    /// Feed one confirmed edge into the state machine, run any recovery
    /// pulse it starts, then update listeners.  Returns the status pushed.
    pub async fn dispatch_event(&self, event: DoorEvent) -> StatusRecord {
        let dispatched = self.core().dispatch(event);
        if let Dispatch::Pulse(pulse) = dispatched {
            self.run_recovery_pulse(pulse).await;
        }
        self.refresh_listeners()
    }

    /// `err_close` as a standalone operation.  Returns `false` without a
    /// pulse unless the door is in `Error`; otherwise whether the close
    /// resumed after the pulse.  Listeners are updated once it ends.
    pub async fn err_close(&self) -> bool {
        let pulse = self.core().begin_recovery_pulse();
        match pulse {
            Some(pulse) => {
                let resumed = self.run_recovery_pulse(pulse).await;
                self.refresh_listeners();
                resumed
            }
            None => false,
        }
    }

    /// Wait out `pulse`, finish it, and keep going while replayed events
    /// start new ones.  Returns whether the first pulse freed the door.
    async fn run_recovery_pulse(&self, pulse: RecoveryPulse) -> bool {
        let (resumed, mut next) = self.wait_and_finish(pulse).await;
        while let Some(chained) = next.take() {
            next = self.wait_and_finish(chained).await.1;
        }
        resumed
    }

    async fn wait_and_finish(&self, pulse: RecoveryPulse) -> (bool, Option<RecoveryPulse>) {
        debug!("recovery pulse for {:?}", self.recovery_pulse);
        async_io_mini::Timer::after(self.recovery_pulse).await;
        self.core().finish_recovery_pulse(pulse)
    }

    // ── Commands ──────────────────────────────────────────────
    //
    // The in-process commands push to listeners when they change
    // something; the command server goes through `execute` instead and
    // pushes after its reply.

    pub fn open(&self) -> bool {
        let accepted = self.core().open();
        if accepted {
            self.refresh_listeners();
        }
        accepted
    }

    pub fn close(&self) -> bool {
        let accepted = self.core().close();
        if accepted {
            self.refresh_listeners();
        }
        accepted
    }

    /// Always accepted, so always pushes.
    pub fn stop(&self) -> bool {
        let accepted = self.core().stop();
        self.refresh_listeners();
        accepted
    }

    /// Add `subscriber` to the push set.  `false` without a connection.
    pub fn enroll(&self, subscriber: Option<Subscriber>) -> bool {
        self.listeners().enroll(subscriber)
    }

    /// Run one parsed command (`None` for an unrecognised line) and return
    /// its outcome with the status to reply with.  Does not push to
    /// listeners; the caller does that once the reply is on the wire.
    pub fn execute(
        &self,
        command: Option<Command>,
        subscriber: Option<Subscriber>,
    ) -> (CommandOutcome, StatusRecord) {
        let mut core = self.core();
        let outcome = match command {
            None => CommandOutcome::Unrecognized,
            Some(Command::Status) => CommandOutcome::Status,
            Some(Command::Open) => CommandOutcome::from_bool(core.open(), core.state()),
            Some(Command::Close) => CommandOutcome::from_bool(core.close(), core.state()),
            Some(Command::Stop) => CommandOutcome::from_bool(core.stop(), core.state()),
            Some(Command::Enroll) => {
                CommandOutcome::from_bool(self.enroll(subscriber), core.state())
            }
        };
        (outcome, core.status())
    }

    // ── Queries and listeners ─────────────────────────────────

    pub fn state(&self) -> DoorState {
        self.core().state()
    }

    pub fn status(&self) -> StatusRecord {
        self.core().status()
    }

    /// Sample one input under the door lock.
    pub fn read_input(&self, line: InputLine) -> bool {
        self.core().read_input(line)
    }

    /// Write `wire` to connection `id` under the listener lock if it is
    /// enrolled.  `None` otherwise.
    pub fn write_to_listener(&self, id: ConnectionId, wire: &str) -> Option<io::Result<()>> {
        self.listeners().write_to(id, wire)
    }

    /// Push `status` to every listener.  Returns how many remain.
    pub fn broadcast(&self, status: &StatusRecord) -> usize {
        self.listeners().notify_enrolled(status)
    }

    /// Push the current status to every listener.
    pub fn refresh_listeners(&self) -> StatusRecord {
        let status = self.status();
        self.broadcast(&status);
        status
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners().len()
    }

    /// Release the outputs and drop every listener.
    pub fn shutdown(&self) {
        self.core().shutdown();
        self.listeners().clear();
    }

    /// Run `f` with the service locked (diagnostics and tests).
    pub fn with_service<R>(&self, f: impl FnOnce(&mut DoorService<P, S>) -> R) -> R {
        f(&mut self.core())
    }
}
