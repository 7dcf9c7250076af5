//! Command engine: turns decoded lines into replies.
//!
//! **Transport-decoupled**: the engine does not own a socket.  The I/O
//! task feeds it one decoded line plus a way to obtain the originating
//! connection (only consulted for `enroll`) and gets back an [`Exchange`]:
//! the reply to write, and whether listeners should then be updated.
//!
//! Reply wire format:
//! ```text
//! Ok | Incorrect State | Error | Status   ← headline
//! {"state":"…","upper":…,"lower":…,"up":…,"down":…}
//! ```
//!
//! Status pushes to enrolled listeners use the `Status` form.

use log::{debug, warn};

use crate::app::commands::{Command, CommandOutcome};
use crate::app::events::StatusRecord;
use crate::app::ports::{EventSink, PinPort};
use crate::app::shared::SharedDoor;

use super::broadcast::Subscriber;
use super::codec::LineError;

/// One reply block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// The command ran.
    Ok(StatusRecord),
    /// The command is not allowed in the current state.
    IncorrectState(StatusRecord),
    /// The line was not a known command.
    Error(StatusRecord),
    /// Answer to `status`, and every push to listeners.
    Status(StatusRecord),
}

impl Reply {
    pub fn from_outcome(outcome: CommandOutcome, status: StatusRecord) -> Self {
        match outcome {
            CommandOutcome::Accepted => Self::Ok(status),
            CommandOutcome::Refused(_) => Self::IncorrectState(status),
            CommandOutcome::Status => Self::Status(status),
            CommandOutcome::Unrecognized => Self::Error(status),
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Self::Ok(_) => "Ok",
            Self::IncorrectState(_) => "Incorrect State",
            Self::Error(_) => "Error",
            Self::Status(_) => "Status",
        }
    }

    pub fn status(&self) -> &StatusRecord {
        match self {
            Self::Ok(s) | Self::IncorrectState(s) | Self::Error(s) | Self::Status(s) => s,
        }
    }

    /// Render as `<headline>\n<json>\n`.
    pub fn to_wire(&self) -> String {
        format!("{}\n{}\n", self.headline(), self.status().to_json())
    }

    /// Rebuild a reply from its two wire lines (terminators optional).
    pub fn parse(headline: &str, body: &str) -> Option<Self> {
        let status = StatusRecord::from_json(body.trim())?;
        match headline.trim() {
            "Ok" => Some(Self::Ok(status)),
            "Incorrect State" => Some(Self::IncorrectState(status)),
            "Error" => Some(Self::Error(status)),
            "Status" => Some(Self::Status(status)),
            _ => None,
        }
    }
}

/// Result of handling one request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exchange {
    pub reply: Reply,
    /// Push the reply's status to listeners after the reply is written.
    pub broadcast: bool,
}

/// Interpret one decoded line against the door.
///
/// `origin` is called only for `enroll`; it should hand back a writable
/// clone of the requesting connection, or `None` if that is impossible.
/// Undecodable and unknown lines produce `Error` and still update
/// listeners.
pub fn handle_line<P, S>(
    door: &SharedDoor<P, S>,
    line: Result<&str, LineError>,
    origin: impl FnOnce() -> Option<Subscriber>,
) -> Exchange
where
    P: PinPort,
    S: EventSink,
{
    let command = match line {
        Ok(text) => {
            let command = Command::parse(text);
            if command.is_none() {
                warn!("Unknown command {:?}", text.trim());
            }
            command
        }
        Err(e) => {
            warn!("Undecodable command line: {}", e);
            None
        }
    };
    debug!("command: {:?}", command.map(Command::name));

    let subscriber = match command {
        Some(Command::Enroll) => origin(),
        _ => None,
    };
    let (outcome, status) = door.execute(command, subscriber);

    Exchange {
        reply: Reply::from_outcome(outcome, status),
        broadcast: command.is_none_or(Command::triggers_broadcast),
    }
}
