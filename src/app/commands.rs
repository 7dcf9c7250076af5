//! Inbound commands to the door.
//!
//! These arrive as text lines on the command channel and are interpreted
//! by [`SharedDoor::execute`](super::shared::SharedDoor::execute).

use crate::fsm::DoorState;

/// Commands a remote client can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Open,
    Close,
    Stop,
    Status,
    /// Register the originating connection for status pushes.
    Enroll,
}

impl Command {
    /// Parse one protocol line.  Surrounding whitespace and case are ignored;
    /// anything unrecognised yields `None`.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "open" => Some(Self::Open),
            "close" => Some(Self::Close),
            "stop" => Some(Self::Stop),
            "status" => Some(Self::Status),
            "enroll" => Some(Self::Enroll),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Stop => "stop",
            Self::Status => "status",
            Self::Enroll => "enroll",
        }
    }

    /// Everything except `status` may change what listeners should see.
    pub fn triggers_broadcast(self) -> bool {
        self != Self::Status
    }
}

/// What a command produced, before it is rendered as a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The operation ran (`Ok`).
    Accepted,
    /// Not allowed in the current state (`Incorrect State`).
    Refused(DoorState),
    /// A read-only status query.
    Status,
    /// Unrecognised command (`Error`).
    Unrecognized,
}

impl CommandOutcome {
    pub fn from_bool(ok: bool, state: DoorState) -> Self {
        if ok { Self::Accepted } else { Self::Refused(state) }
    }
}
