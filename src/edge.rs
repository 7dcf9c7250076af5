//! Debounced edge source.
//!
//! Turns raw input levels into confirmed door events.  Each of the four
//! input lines gets its own watcher task:
//!
//! 1. sample the line every poll interval;
//! 2. a level that differs from the last accepted level is an edge unless
//!    another edge on the same line was accepted within the debounce
//!    window; a difference that outlasts the window is accepted later;
//! 3. after an accepted edge, wait the settle delay and re-sample;
//! 4. still high: dispatch the line's event.  Low: suppress it, but still
//!    push a fresh status to listeners (a release changes the inputs);
//! 5. the detector takes the re-sampled level as its new baseline.
//!
//! All watchers run on one `edge_executor::LocalExecutor` in a dedicated
//! thread; `async-io-mini` timers do the waiting.  A watcher sleeping
//! through its settle delay or a recovery pulse does not hold up the
//! others.
//!
//! ```text
//!  ┌──────────────────────────────────────────────┐
//!  │  Edge Thread                                 │
//!  │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐ │
//!  │  │ upper  │ │ lower  │ │   up   │ │  down  │ │
//!  │  │ poll ⏱ │ │ poll ⏱ │ │ poll ⏱ │ │ poll ⏱ │ │
//!  │  └───┬────┘ └───┬────┘ └───┬────┘ └───┬────┘ │
//!  │      └──────────┴─────┬────┴──────────┘      │
//!  │                       ▼                      │
//!  │          SharedDoor::dispatch_event          │
//!  └──────────────────────────────────────────────┘
//! ```

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::app::ports::{EventSink, PinPort};
use crate::app::shared::SharedDoor;
use crate::config::DoorConfig;
use crate::fsm::DoorEvent;
use crate::fsm::context::InputLine;

/// How often the executor checks the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

/// Timing of the edge source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeTiming {
    /// Minimum spacing between accepted edges on one line.
    pub debounce: Duration,
    /// Delay between an accepted edge and the confirming re-sample.
    pub settle: Duration,
    /// Input sampling period.
    pub poll: Duration,
}

impl EdgeTiming {
    pub fn from_config(config: &DoorConfig) -> Self {
        Self {
            debounce: config.debounce(),
            settle: config.settle_delay(),
            poll: config.poll_interval(),
        }
    }
}

impl Default for EdgeTiming {
    fn default() -> Self {
        Self::from_config(&DoorConfig::default())
    }
}

// ── Debounce ─────────────────────────────────────────────────

/// Per-line edge detector with a debounce window.
///
/// `level` is the last accepted (or confirmed) level, never a raw sample
/// rejected as bounce.
#[derive(Debug, Clone)]
pub struct EdgeDetector {
    level: bool,
    last_accepted: Option<Instant>,
    debounce: Duration,
}

impl EdgeDetector {
    pub fn new(initial_level: bool, debounce: Duration) -> Self {
        Self {
            level: initial_level,
            last_accepted: None,
            debounce,
        }
    }

    /// Feed one sample taken at `now`.  Returns `true` when it differs
    /// from the accepted level outside the debounce window of the previous
    /// accepted edge.  Rejected samples leave the detector untouched.
    pub fn sample(&mut self, level: bool, now: Instant) -> bool {
        if level == self.level {
            return false;
        }
        let bouncing = self
            .last_accepted
            .is_some_and(|prev| now.saturating_duration_since(prev) < self.debounce);
        if bouncing {
            return false;
        }
        self.level = level;
        self.last_accepted = Some(now);
        true
    }

    /// Adopt the level seen by the confirming re-sample.
    pub fn resync(&mut self, level: bool) {
        self.level = level;
    }

    pub fn level(&self) -> bool {
        self.level
    }
}

// ── Confirmation ─────────────────────────────────────────────

/// Settle, re-sample and dispatch.  Returns the dispatched event, or
/// `None` if the line had dropped again.
pub async fn confirm_edge<P, S>(
    door: &SharedDoor<P, S>,
    line: InputLine,
    settle: Duration,
) -> Option<DoorEvent>
where
    P: PinPort,
    S: EventSink,
{
    async_io_mini::Timer::after(settle).await;
    if door.read_input(line) {
        let event = line.event();
        debug!("{} confirmed, dispatching '{}'", line.name(), event);
        door.dispatch_event(event).await;
        Some(event)
    } else {
        debug!("{} low after settle, not dispatching", line.name());
        door.refresh_listeners();
        None
    }
}

/// Watch one input line until `shutdown` is raised.
pub async fn watch_line<P, S>(
    door: Arc<SharedDoor<P, S>>,
    line: InputLine,
    timing: EdgeTiming,
    shutdown: Arc<AtomicBool>,
) where
    P: PinPort,
    S: EventSink,
{
    let mut detector = EdgeDetector::new(door.read_input(line), timing.debounce);
    debug!("watching {} (initial level {})", line.name(), detector.level());
    while !shutdown.load(Ordering::Acquire) {
        let level = door.read_input(line);
        if detector.sample(level, Instant::now()) {
            debug!("{} edge -> {}", line.name(), level);
            let confirmed = confirm_edge(&door, line, timing.settle).await;
            detector.resync(confirmed.is_some());
        }
        async_io_mini::Timer::after(timing.poll).await;
    }
}

async fn wait_for_shutdown(shutdown: Arc<AtomicBool>) {
    while !shutdown.load(Ordering::Acquire) {
        async_io_mini::Timer::after(SHUTDOWN_POLL).await;
    }
}

// ── Thread spawn ─────────────────────────────────────────────

/// Entry point for the edge thread.
fn run_edge_loop<P, S>(door: Arc<SharedDoor<P, S>>, timing: EdgeTiming, shutdown: Arc<AtomicBool>)
where
    P: PinPort + 'static,
    S: EventSink + 'static,
{
    let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();

    for line in InputLine::ALL {
        executor
            .spawn(watch_line(door.clone(), line, timing, shutdown.clone()))
            .detach();
    }

    info!(
        "Edge source started (poll {:?}, debounce {:?}, settle {:?})",
        timing.poll, timing.debounce, timing.settle
    );

    futures_lite::future::block_on(executor.run(wait_for_shutdown(shutdown)));
    info!("Edge source stopped");
}

/// Spawn the edge thread.  It exits once `shutdown` is raised.
pub fn spawn<P, S>(
    door: Arc<SharedDoor<P, S>>,
    timing: EdgeTiming,
    shutdown: Arc<AtomicBool>,
) -> io::Result<JoinHandle<()>>
where
    P: PinPort + 'static,
    S: EventSink + 'static,
{
    thread::Builder::new()
        .name("coop-edge".into())
        .spawn(move || run_edge_loop(door, timing, shutdown))
}
