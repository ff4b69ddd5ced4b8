//! Adapter implementations for port traits.
//!
//! - `providers/` — inference backends (HTTP model server, local synthetic generator)
//! - `sinks/` — image destinations (file, shared texture frame)
//! - `udp` — datagram request transport

pub mod providers;
pub mod sinks;
pub mod udp;
