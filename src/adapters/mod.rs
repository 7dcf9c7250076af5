//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements | Connects to                       |
//! |-------------|------------|-----------------------------------|
//! | `hardware`  | PinPort    | embedded-hal digital pins         |
//! | `simulated` | PinPort    | in-memory bank (tests, bench runs)|
//! | `log_sink`  | EventSink  | `log` facade                      |

pub mod hardware;
pub mod log_sink;
pub mod simulated;
