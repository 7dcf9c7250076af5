//! Command channel: newline-delimited text protocol over TCP.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     Command Stack                          │
//! │                                                            │
//! │  ┌──────────┐   ┌──────────┐   ┌───────────────────────┐   │
//! │  │ io_task  │──▶│  codec   │──▶│  engine               │   │
//! │  │ (TCP)    │   │ (lines)  │   │  → SharedDoor         │   │
//! │  └──────────┘   └──────────┘   └───────────────────────┘   │
//! │       ▲                                    │               │
//! │       │              ┌─────────────────────┘               │
//! │       │              ▼                                     │
//! │  ┌──────────┐   ┌───────────┐                              │
//! │  │ enrolled │◀──│ broadcast │   (status pushes)            │
//! │  │ sockets  │   │ registry  │                              │
//! │  └──────────┘   └───────────┘                              │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod broadcast;
pub mod codec;
pub mod engine;
pub mod io_task;
