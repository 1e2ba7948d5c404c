use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::codec::{checksum, MAX_PAYLOAD, MIN_FRAME_SIZE};
use crate::error::{FrameError, Result};

/// Coarse message class carried in the frame header.
///
/// The discriminants are the wire ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PacketType {
    /// Keep-alive, normally with an empty payload.
    Heartbeat = 0,
    /// Request from one side to the other.
    Command = 1,
    /// Unsolicited data (telemetry, sensor readings).
    Data = 2,
    /// Answer to an earlier command.
    Response = 3,
    /// Error report.
    Error = 4,
}

impl PacketType {
    /// Every packet type, in wire-ordinal order.
    pub const ALL: [PacketType; 5] = [
        PacketType::Heartbeat,
        PacketType::Command,
        PacketType::Data,
        PacketType::Response,
        PacketType::Error,
    ];

    /// Map a wire ordinal to a packet type.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    /// The wire ordinal.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Upper-case label used in logs and CLI output.
    pub fn name(self) -> &'static str {
        match self {
            PacketType::Heartbeat => "HEARTBEAT",
            PacketType::Command => "COMMAND",
            PacketType::Data => "DATA",
            PacketType::Response => "RESPONSE",
            PacketType::Error => "ERROR",
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for PacketType {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_u8(value).ok_or(FrameError::UnknownPacketType(value))
    }
}

impl FromStr for PacketType {
    type Err = FrameError;

    /// Accepts a case-insensitive name (`command`) or a wire ordinal (`1`).
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Ok(ordinal) = trimmed.parse::<u8>() {
            return Self::try_from(ordinal);
        }
        Self::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| FrameError::UnknownPacketName(trimmed.to_string()))
    }
}

/// A typed, sequenced packet.
///
/// A `Packet` can only be built with a payload that fits the 16-bit length
/// field, so every value is encodable. The checksum is derived from the
/// payload rather than stored, which keeps the two from ever disagreeing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    packet_type: PacketType,
    sequence: u16,
    payload: Bytes,
}

impl Packet {
    /// Build a packet, rejecting payloads longer than [`MAX_PAYLOAD`].
    pub fn new(packet_type: PacketType, sequence: u16, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD,
            });
        }
        Ok(Self {
            packet_type,
            sequence,
            payload,
        })
    }

    /// Build a packet whose payload length was read from a 16-bit field.
    pub(crate) fn from_wire(packet_type: PacketType, sequence: u16, payload: Bytes) -> Self {
        debug_assert!(payload.len() <= MAX_PAYLOAD);
        Self {
            packet_type,
            sequence,
            payload,
        }
    }

    /// A heartbeat with an empty payload.
    pub fn heartbeat(sequence: u16) -> Self {
        Self {
            packet_type: PacketType::Heartbeat,
            sequence,
            payload: Bytes::new(),
        }
    }

    pub fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Consume the packet and keep only its payload.
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Additive checksum of the payload, as written to the wire.
    pub fn checksum(&self) -> u16 {
        checksum(&self.payload)
    }

    /// The total wire size of this packet's frame.
    pub fn wire_size(&self) -> usize {
        MIN_FRAME_SIZE + self.payload.len()
    }
}
