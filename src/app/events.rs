//! Outbound application events and the status record.
//!
//! The [`DoorService`](super::service::DoorService) emits [`AppEvent`]s
//! through the [`EventSink`](super::ports::EventSink) port.  The
//! [`StatusRecord`] is the snapshot served to clients.

use serde::{Deserialize, Serialize};

use crate::fsm::context::InputLevels;
use crate::fsm::{DoorEvent, DoorState};

/// Structured events emitted by the door core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service established its resting state (carries that state).
    Started(DoorState),

    /// The door moved between states.
    StateChanged { from: DoorState, to: DoorState },

    /// An event had no mapping in the current state.
    EventIgnored { state: DoorState, event: DoorEvent },

    /// An event arrived during a recovery pulse and was queued.
    EventDeferred(DoorEvent),

    /// Upper limit fired while closing; power was cut.
    JamDetected,

    /// Recovery pulse freed the door; closing resumed.
    JamCleared,

    /// Recovery pulse did not free the door.
    RecoveryFailed,

    /// Outputs released for process exit.
    ShutDown,
}

/// Point-in-time status served over the command channel.
///
/// Serialises as a flat JSON object:
/// `{"state":"closed","upper":false,"lower":true,"up":false,"down":false}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub state: DoorState,
    #[serde(flatten)]
    pub inputs: InputLevels,
}

impl StatusRecord {
    pub fn to_json(&self) -> String {
        // A struct of a unit enum and four bools cannot fail to serialise.
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }

    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}
