//! CoopDoor daemon: main entry point.
//!
//! Hexagonal layout with two service threads around one serialised core.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HalPins<SysfsPin>   SimulatedPins   LogEventSink              │
//! │  (PinPort)           (PinPort)       (EventSink)               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │        SharedDoor ─ DoorService (state machine)        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │        ▲ events                         ▲ commands │ pushes    │
//! │  edge thread (4 line watchers)    rpc thread (TCP clients)     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `coopdoor [CONFIG.json]` (or `COOPDOOR_CONFIG=...`).  Runs until
//! SIGINT/SIGTERM, then releases the outputs and exits.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use log::{error, info};
use nix::sys::signal::{SigSet, Signal};

use coopdoor::adapters::hardware::{HalPins, InputBank};
use coopdoor::adapters::log_sink::LogEventSink;
use coopdoor::adapters::simulated::SimulatedPins;
use coopdoor::app::ports::PinPort;
use coopdoor::app::shared::SharedDoor;
use coopdoor::config::{DoorConfig, PinBackend, PinMap};
use coopdoor::drivers::sysfs_gpio::SysfsPin;
use coopdoor::edge::{self, EdgeTiming};
use coopdoor::rpc::io_task::CommandServer;

const CONFIG_ENV: &str = "COOPDOOR_CONFIG";

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("CoopDoor v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config()?;

    // ── 3. Signals ────────────────────────────────────────────
    // Blocked before any thread starts so every thread inherits the mask
    // and the main thread alone receives them.
    let mut signals = SigSet::empty();
    signals.add(Signal::SIGINT);
    signals.add(Signal::SIGTERM);
    signals.thread_block().context("blocking shutdown signals")?;

    // ── 4. Pins and run ───────────────────────────────────────
    match config.backend {
        PinBackend::Sysfs => {
            let pins = sysfs_pins(&config.pins)?;
            run(pins, &config, &signals)
        }
        PinBackend::Simulated => {
            info!("Using simulated pins");
            run(SimulatedPins::new(), &config, &signals)
        }
    }
}

fn load_config() -> Result<DoorConfig> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

    match path {
        Some(path) => DoorConfig::load(&path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => {
            info!("No config given, using defaults");
            Ok(DoorConfig::default())
        }
    }
}

/// Export the six door lines.  Outputs come up de-energised.
fn sysfs_pins(map: &PinMap) -> Result<HalPins<SysfsPin, SysfsPin>> {
    let input = |gpio: u32| {
        SysfsPin::export_input(gpio).with_context(|| format!("exporting input gpio{gpio}"))
    };
    let inputs = InputBank {
        upper: input(map.upper)?,
        lower: input(map.lower)?,
        up: input(map.up)?,
        down: input(map.down)?,
    };
    // Power "off" is electrically high on an active-low driver.
    let power = SysfsPin::export_output(map.power, map.power_active_low)
        .with_context(|| format!("exporting power gpio{}", map.power))?;
    let direction = SysfsPin::export_output(map.direction, false)
        .with_context(|| format!("exporting direction gpio{}", map.direction))?;

    Ok(HalPins::new(inputs, power, direction, map.power_active_low))
}

fn run<P: PinPort + 'static>(pins: P, config: &DoorConfig, signals: &SigSet) -> Result<()> {
    let door = Arc::new(SharedDoor::start(
        pins,
        LogEventSink::new(),
        config.recovery_pulse(),
    ));
    let shutdown = Arc::new(AtomicBool::new(false));

    let server = CommandServer::bind(config.listen_addr(), door.clone(), shutdown.clone())
        .with_context(|| format!("binding command port {}", config.listen_addr()))?;
    let rpc = server.spawn().context("spawning command thread")?;
    let edges = edge::spawn(door.clone(), EdgeTiming::from_config(config), shutdown.clone())
        .context("spawning edge thread")?;

    let signal = signals.wait().context("waiting for shutdown signal")?;
    info!("Received {:?}, shutting down", signal);

    // Threads first, so no late event can re-energise the motor.
    shutdown.store(true, Ordering::Release);
    join("command", rpc);
    join("edge", edges);
    door.shutdown();

    info!("Bye");
    Ok(())
}

fn join(name: &str, handle: JoinHandle<()>) {
    if handle.join().is_err() {
        error!("{} thread panicked", name);
    }
}
