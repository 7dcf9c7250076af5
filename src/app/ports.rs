//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DoorService (domain)
//! ```
//!
//! Driven adapters (pin banks, event sinks) implement these traits.  The
//! [`DoorService`](super::service::DoorService) consumes them via generics,
//! so the domain core never touches hardware directly.

use crate::error::PinError;
use crate::fsm::context::{InputLine, OutputLine};

// ───────────────────────────────────────────────────────────────
// Pin port (driven adapter: domain ↔ GPIO)
// ───────────────────────────────────────────────────────────────

/// Logical access to the six door lines.
///
/// Levels are logical: `read` returns `true` when the switch is closed,
/// `write(Power, true)` energises the motor.  Implementations translate
/// to the electrical polarity of the board.
pub trait PinPort: Send {
    /// Sample one input line.
    fn read(&mut self, line: InputLine) -> Result<bool, PinError>;

    /// Drive one output line.
    fn write(&mut self, line: OutputLine, level: bool) -> Result<(), PinError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink: Send {
    fn emit(&mut self, event: &super::events::AppEvent);
}
