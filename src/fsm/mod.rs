//! Door state machine vocabulary and the fixed transition table.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  TransitionTable                                          │
//! │  ┌───────────────┬────────┬────────┬──────────┬────────┐  │
//! │  │ DoorState     │ up     │ down   │ upper    │ lower  │  │
//! │  ├───────────────┼────────┼────────┼──────────┼────────┤  │
//! │  │ Open          │   ·    │ Close  │    ·     │   ·    │  │
//! │  │ Closed        │ Open   │   ·    │    ·     │   ·    │  │
//! │  │ Opening       │ Stop   │ Stop   │ Stop     │   ·    │  │
//! │  │ Closing       │ Stop   │   ·    │ Error    │ Stop   │  │
//! │  │ Stopped       │ Open   │ Close  │    ·     │   ·    │  │
//! │  │ Error         │   ·    │ErrClose│ Stop     │ Stop   │  │
//! │  │ ErrorRecovery │   ·    │   ·    │ Stop     │ Stop   │  │
//! │  │ Dead          │   ·    │   ·    │    ·     │   ·    │  │
//! │  │ Unknown       │   ·    │   ·    │    ·     │   ·    │  │
//! │  └───────────────┴────────┴────────┴──────────┴────────┘  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! A `·` cell is an explicit no-op.  The table only names *which*
//! operation runs; the operations themselves live in
//! [`DoorService`](crate::app::service::DoorService), which owns the
//! output lines.

pub mod context;
pub mod states;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Every state the door can be in.
/// Must stay in sync with the rows built in [`states::build_transition_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DoorState {
    Open = 0,
    Closed = 1,
    Opening = 2,
    Closing = 3,
    Stopped = 4,
    Error = 5,
    ErrorRecovery = 6,
    Dead = 7,
    /// Before the first resting-state computation.
    Unknown = 8,
}

impl DoorState {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 9;

    pub const ALL: [DoorState; Self::COUNT] = [
        Self::Open,
        Self::Closed,
        Self::Opening,
        Self::Closing,
        Self::Stopped,
        Self::Error,
        Self::ErrorRecovery,
        Self::Dead,
        Self::Unknown,
    ];

    /// Convert an index back to `DoorState`.  Panics on out-of-range in
    /// debug builds; returns `Unknown` in release.
    pub fn from_index(idx: usize) -> Self {
        match Self::ALL.get(idx) {
            Some(state) => *state,
            None => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Unknown
            }
        }
    }

    /// Wire name, as reported in the status record.
    pub fn name(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Closing => "closing",
            Self::Stopped => "stopped",
            Self::Error => "error",
            Self::ErrorRecovery => "error_recovery",
            Self::Dead => "dead",
            Self::Unknown => "unknown",
        }
    }
}

impl core::fmt::Display for DoorState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A debounced, high-confirmed transition on one of the four input lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DoorEvent {
    /// Manual "up" command switch.
    Up = 0,
    /// Manual "down" command switch.
    Down = 1,
    /// Upper limit switch (door fully open).
    Upper = 2,
    /// Lower limit switch (door fully closed).
    Lower = 3,
}

impl DoorEvent {
    pub const COUNT: usize = 4;

    pub const ALL: [DoorEvent; Self::COUNT] = [Self::Up, Self::Down, Self::Upper, Self::Lower];

    pub fn name(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Upper => "upper",
            Self::Lower => "lower",
        }
    }
}

impl core::fmt::Display for DoorEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Operation tags
// ---------------------------------------------------------------------------

/// Operation named by a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Open,
    Close,
    Stop,
    /// Jam detected while closing: immediate power cut.
    Error,
    /// Manual recovery attempt out of `Error`.
    ErrClose,
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// One row: the operation for each event while in `state`.
#[derive(Debug, Clone, Copy)]
pub struct TransitionRow {
    pub state: DoorState,
    pub on_up: Option<Operation>,
    pub on_down: Option<Operation>,
    pub on_upper: Option<Operation>,
    pub on_lower: Option<Operation>,
}

impl TransitionRow {
    /// A row where every event is a no-op.
    pub const fn inert(state: DoorState) -> Self {
        Self {
            state,
            on_up: None,
            on_down: None,
            on_upper: None,
            on_lower: None,
        }
    }

    fn cell(&self, event: DoorEvent) -> Option<Operation> {
        match event {
            DoorEvent::Up => self.on_up,
            DoorEvent::Down => self.on_down,
            DoorEvent::Upper => self.on_upper,
            DoorEvent::Lower => self.on_lower,
        }
    }
}

/// Fixed-size state × event table indexed by `DoorState as usize`.
pub struct TransitionTable {
    rows: [TransitionRow; DoorState::COUNT],
}

impl TransitionTable {
    pub fn new(rows: [TransitionRow; DoorState::COUNT]) -> Self {
        for (idx, row) in rows.iter().enumerate() {
            debug_assert_eq!(row.state as usize, idx, "row {idx} out of order");
        }
        Self { rows }
    }

    /// Operation mapped for `(state, event)`, or `None` for a no-op.
    pub fn lookup(&self, state: DoorState, event: DoorEvent) -> Option<Operation> {
        self.rows[state as usize].cell(event)
    }

    /// Whether `state` has any handler for `event`.
    pub fn permits(&self, state: DoorState, event: DoorEvent) -> bool {
        self.lookup(state, event).is_some()
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::new(states::build_transition_table())
    }
}
