//! photond - acquisition daemon for a serial-attached photon counter
//!
//! The daemon reads a continuous byte stream from the instrument in
//! fixed-size chunks, reassembles those chunks into fixed-size packets, and
//! serves the packets to TCP clients on demand.
//!
//! ## Protocol
//!
//! - On connect the server sends the packet size as ASCII digits followed by
//!   the literal `EOT` (e.g. `65536EOT`).
//! - Clients send exactly 8 ASCII bytes per request: `GIVEDATA` to receive
//!   one packet (the next `BUF` raw bytes), or `KTHXBYE!` to shut the
//!   server down.

pub mod app;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod server;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
