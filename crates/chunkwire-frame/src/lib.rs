//! Checksummed packet framing and stream reassembly.
//!
//! Every packet travels in a self-delimiting frame:
//! - A 4-byte leading magic (`AA BB CC DD`) used to find frame starts
//! - A 1-byte packet type, a big-endian sequence number and payload length
//! - The payload, then a 16-bit additive checksum and a 2-byte trailing magic (`EE FF`)
//!
//! [`StreamReassembler`] recovers these frames from byte chunks of any size
//! and skips corrupted data one byte at a time until the next valid frame.

pub mod codec;
pub mod error;
pub mod packet;
pub mod reassembler;

#[cfg(feature = "async")]
pub mod tokio_codec;

pub use codec::{
    checksum, decode, encode, encode_into, probe, FrameStatus, InvalidFrame, HEADER_SIZE,
    LEADING_MAGIC, MAX_FRAME_SIZE, MAX_PAYLOAD, MIN_FRAME_SIZE, TRAILER_SIZE, TRAILING_MAGIC,
};
pub use error::{FrameError, Result};
pub use packet::{Packet, PacketType};
pub use reassembler::{Packets, ReassemblerConfig, StreamReassembler, DEFAULT_MAX_BUFFER};

#[cfg(feature = "async")]
pub use tokio_codec::PacketCodec;
