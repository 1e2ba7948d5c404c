//! Checksummed packet framing and stream reassembly for links that deliver
//! bytes in arbitrary chunks (BLE notifications, serial lines, sockets).
//!
//! # Crate Structure
//!
//! - [`transport`]: the outbound `Transport` seam and reference adapters
//! - [`frame`]: packet model, wire codec and the stream reassembler
//! - [`session`]: per-device sessions with sequencing and typed events (behind `session` feature)
//!
//! # Example
//!
//! ```
//! use chunkwire::frame::PacketType;
//! use chunkwire::session::{ProtocolSession, SessionEvent};
//! use chunkwire::transport::MemoryTransport;
//!
//! let link = MemoryTransport::with_mtu(20);
//! let (mut host, _) = ProtocolSession::new(link.clone());
//! host.send_command("INIT").unwrap();
//!
//! let (mut device, mut events) = ProtocolSession::new(MemoryTransport::new());
//! for chunk in link.take_chunks() {
//!     device.on_chunk(&chunk);
//! }
//! match events.try_recv() {
//!     Some(SessionEvent::Packet(packet)) => {
//!         assert_eq!(packet.packet_type, PacketType::Command);
//!         assert_eq!(packet.payload_str(), Some("INIT"));
//!     }
//!     other => panic!("unexpected event: {other:?}"),
//! }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use chunkwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use chunkwire_frame::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use chunkwire_session::*;
}
