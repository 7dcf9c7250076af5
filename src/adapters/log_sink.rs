//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (syslog / journald in production via the binary's
//! logger).

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            AppEvent::EventIgnored { state, event } => {
                info!("EVENT | '{}' ignored in {}", event, state);
            }
            AppEvent::EventDeferred(event) => {
                info!("EVENT | '{}' deferred until recovery pulse ends", event);
            }
            AppEvent::JamDetected => {
                error!("FAULT | jam detected while closing");
            }
            AppEvent::JamCleared => {
                warn!("FAULT | jam cleared, close resumed");
            }
            AppEvent::RecoveryFailed => {
                error!("FAULT | still jammed, door is dead until serviced");
            }
            AppEvent::ShutDown => {
                info!("STOP  | outputs released");
            }
        }
    }
}
