//! Transition table builder.
//!
//! One row per [`DoorState`], in index order.  Cells left `None` are
//! explicit no-ops.
//!
//! ```text
//!            ┌──[up]──▶ OPENING ──[upper|up|down]──┐
//!  CLOSED ───┘                                      ▼
//!    ▲                                      stop → resting state
//!    │                                      (OPEN / CLOSED / STOPPED)
//!    └──[lower]── CLOSING ◀──[down]── OPEN / STOPPED
//!                    │
//!                 [upper]  (string wound back up: jam)
//!                    ▼
//!                  ERROR ──[down]──▶ pulse ──▶ ERROR_RECOVERY | DEAD
//! ```

use super::{DoorState, Operation, TransitionRow};

use Operation::{Close, ErrClose, Error, Open, Stop};

/// Build the static transition table.  Called once at startup.
pub fn build_transition_table() -> [TransitionRow; DoorState::COUNT] {
    [
        // Index 0: Open
        TransitionRow {
            on_down: Some(Close),
            ..TransitionRow::inert(DoorState::Open)
        },
        // Index 1: Closed
        TransitionRow {
            on_up: Some(Open),
            ..TransitionRow::inert(DoorState::Closed)
        },
        // Index 2: Opening
        TransitionRow {
            state: DoorState::Opening,
            on_up: Some(Stop),
            on_down: Some(Stop),
            on_upper: Some(Stop),
            on_lower: None,
        },
        // Index 3: Closing
        TransitionRow {
            state: DoorState::Closing,
            on_up: Some(Stop),
            on_down: None,
            on_upper: Some(Error),
            on_lower: Some(Stop),
        },
        // Index 4: Stopped
        TransitionRow {
            on_up: Some(Open),
            on_down: Some(Close),
            ..TransitionRow::inert(DoorState::Stopped)
        },
        // Index 5: Error
        TransitionRow {
            state: DoorState::Error,
            on_up: None,
            on_down: Some(ErrClose),
            on_upper: Some(Stop),
            on_lower: Some(Stop),
        },
        // Index 6: ErrorRecovery
        TransitionRow {
            on_upper: Some(Stop),
            on_lower: Some(Stop),
            ..TransitionRow::inert(DoorState::ErrorRecovery)
        },
        // Index 7: Dead (terminal; manual intervention only)
        TransitionRow::inert(DoorState::Dead),
        // Index 8: Unknown
        TransitionRow::inert(DoorState::Unknown),
    ]
}
