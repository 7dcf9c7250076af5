//! Integration test driver for `tests/integration/`.
//!
//! Each `mod` below maps to a file that exercises one subsystem against
//! the simulated pin bank and mock push targets.  Command server tests
//! use real TCP sockets on loopback.  No hardware required.

mod broadcast_tests;
mod command_server_tests;
mod door_service_tests;
mod edge_tests;
