//! Line identities and level snapshots shared by the core and its adapters.
//!
//! The core only ever sees logical levels: `true` on an input line means
//! the switch is confirmed closed, `true` on `power` means the motor is
//! energised.  Electrical polarity (active-low drivers, pull-ups) is the
//! hardware adapter's business.

use serde::{Deserialize, Serialize};

use super::DoorEvent;

// ---------------------------------------------------------------------------
// Input lines
// ---------------------------------------------------------------------------

/// The four sensed lines.  Each maps to exactly one [`DoorEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InputLine {
    Upper = 0,
    Lower = 1,
    Up = 2,
    Down = 3,
}

impl InputLine {
    pub const COUNT: usize = 4;

    pub const ALL: [InputLine; Self::COUNT] = [Self::Upper, Self::Lower, Self::Up, Self::Down];

    /// Event delivered when this line is confirmed high.
    pub fn event(self) -> DoorEvent {
        match self {
            Self::Upper => DoorEvent::Upper,
            Self::Lower => DoorEvent::Lower,
            Self::Up => DoorEvent::Up,
            Self::Down => DoorEvent::Down,
        }
    }

    pub fn name(self) -> &'static str {
        self.event().name()
    }
}

// ---------------------------------------------------------------------------
// Output lines
// ---------------------------------------------------------------------------

/// The two actuator lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputLine {
    /// Motor MOSFET.
    Power,
    /// DPDT direction relay.
    Direction,
}

impl OutputLine {
    pub fn name(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Direction => "direction",
        }
    }
}

/// Logical direction request.  Only `Up` energises the relay; `Down` and
/// `Off` leave it released, `Off` additionally meaning "no travel intended".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Off,
    Up,
    Down,
}

impl Direction {
    /// Relay line level for this direction.
    pub fn relay_level(self) -> bool {
        self == Self::Up
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Point-in-time reading of all four input lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputLevels {
    pub upper: bool,
    pub lower: bool,
    pub up: bool,
    pub down: bool,
}

impl InputLevels {
    pub fn get(&self, line: InputLine) -> bool {
        match line {
            InputLine::Upper => self.upper,
            InputLine::Lower => self.lower,
            InputLine::Up => self.up,
            InputLine::Down => self.down,
        }
    }

    pub fn set(&mut self, line: InputLine, level: bool) {
        match line {
            InputLine::Upper => self.upper = level,
            InputLine::Lower => self.lower = level,
            InputLine::Up => self.up = level,
            InputLine::Down => self.down = level,
        }
    }
}

/// Commanded state of the two actuator lines.
///
/// Invariant: `power == false` means the door is not moving; `direction`
/// carries no meaning while power is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputLevels {
    pub power: bool,
    pub direction: Direction,
}

impl OutputLevels {
    /// Power off, relay released.
    pub fn all_off() -> Self {
        Self::default()
    }
}
