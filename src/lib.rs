//! CoopDoor controller library.
//!
//! Exposes the door state machine, the pin adapters, the debounced edge
//! source and the command channel for the `coopdoor` daemon, the
//! `coopctl` client and integration testing.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod client;
pub mod config;
pub mod drivers;
pub mod edge;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod rpc;
