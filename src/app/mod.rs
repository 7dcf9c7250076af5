//! Application core: the door logic behind port traits.
//!
//! This module holds the rules of the coop door: the state machine
//! driver, command interpretation and the status record.  All
//! interaction with pins happens through the **port traits** in
//! [`ports`], keeping this layer testable with a simulated pin bank.
//! [`shared`] serialises access for the edge and command threads.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod shared;
