//! Transport adapter interface for chunkwire.
//!
//! The framing and session layers never talk to a device directly. They hand
//! finished frames to a [`Transport`] and receive arbitrary byte chunks back
//! from whatever owns the connection (a BLE notification callback, a serial
//! port reader, a socket).
//!
//! Reference adapters:
//! - [`IoTransport`] over any `std::io::Write` (serial ports, sockets)
//! - [`MemoryTransport`] for tests and loopback demos, with MTU splitting
//! - [`UnixDomainSocket`] for local socket connections (Unix only)

pub mod error;
pub mod io;
pub mod memory;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use io::IoTransport;
pub use memory::MemoryTransport;
pub use traits::Transport;

#[cfg(unix)]
pub use uds::{UdsStream, UnixDomainSocket};
