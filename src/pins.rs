//! GPIO pin assignments for the coop door board (BCM numbering).
//!
//! Single source of truth for the default wiring; [`PinMap`](crate::config::PinMap)
//! starts from these and may be overridden in the config file.

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Motor MOSFET gate.  Active LOW: the driver energises the motor when
/// this line is pulled down.
pub const POWER_GPIO: u32 = 24;
/// DPDT direction relay.  HIGH = up, LOW = down / released.
pub const DIRECTION_GPIO: u32 = 23;

// ---------------------------------------------------------------------------
// Limit switches (pull-up)
// ---------------------------------------------------------------------------

/// Upper limit switch: door fully open.
pub const UPPER_LIMIT_GPIO: u32 = 22;
/// Lower limit switch: door fully closed.
pub const LOWER_LIMIT_GPIO: u32 = 18;

// ---------------------------------------------------------------------------
// Manual command switches (DPDT momentary, pull-up)
// ---------------------------------------------------------------------------

pub const UP_SWITCH_GPIO: u32 = 25;
pub const DOWN_SWITCH_GPIO: u32 = 17;

// ---------------------------------------------------------------------------
// Command channel
// ---------------------------------------------------------------------------

/// Default TCP port for the line-protocol command server.
pub const COMMAND_PORT: u16 = 8953;
