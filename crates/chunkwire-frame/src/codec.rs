use bytes::{BufMut, Bytes, BytesMut};

use crate::packet::{Packet, PacketType};

/// Leading magic: marks a potential frame start.
pub const LEADING_MAGIC: [u8; 4] = [0xAA, 0xBB, 0xCC, 0xDD];

/// Trailing magic: closes a frame.
pub const TRAILING_MAGIC: [u8; 2] = [0xEE, 0xFF];

/// Frame header: magic (4) + type (1) + sequence (2) + length (2) = 9 bytes.
pub const HEADER_SIZE: usize = 9;

/// Frame trailer: checksum (2) + magic (2) = 4 bytes.
pub const TRAILER_SIZE: usize = 4;

/// Size of a frame with an empty payload.
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + TRAILER_SIZE;

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// Size of a frame carrying [`MAX_PAYLOAD`] bytes.
pub const MAX_FRAME_SIZE: usize = MIN_FRAME_SIZE + MAX_PAYLOAD;

/// Additive checksum: the sum of all bytes modulo 65536.
///
/// Every single-bit payload error changes the sum, but compensating
/// multi-bit errors (one byte up, another down by the same amount) do not.
pub fn checksum(payload: &[u8]) -> u16 {
    payload
        .iter()
        .fold(0u16, |acc, &byte| acc.wrapping_add(u16::from(byte)))
}

/// Encode a packet into a new buffer.
///
/// Wire format (all integers big-endian):
/// ```text
/// ┌─────────────┬──────┬──────────┬──────────┬───────────┬──────────┬─────────┐
/// │ Magic (4B)  │ Type │ Sequence │ Length   │ Payload   │ Checksum │ Magic   │
/// │ AA BB CC DD │ (1B) │ (2B)     │ (2B)     │ (Length)  │ (2B)     │ EE FF   │
/// └─────────────┴──────┴──────────┴──────────┴───────────┴──────────┴─────────┘
/// ```
pub fn encode(packet: &Packet) -> Bytes {
    let mut dst = BytesMut::with_capacity(packet.wire_size());
    encode_into(packet, &mut dst);
    dst.freeze()
}

/// Append a packet's frame to `dst`.
pub fn encode_into(packet: &Packet, dst: &mut BytesMut) {
    let payload = packet.payload();
    dst.reserve(packet.wire_size());
    dst.put_slice(&LEADING_MAGIC);
    dst.put_u8(packet.packet_type().as_u8());
    dst.put_u16(packet.sequence());
    // Packet::new guarantees the length fits in u16.
    dst.put_u16(payload.len() as u16);
    dst.put_slice(payload);
    dst.put_u16(checksum(payload));
    dst.put_slice(&TRAILING_MAGIC);
}

/// Why a buffer prefix is not a valid frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidFrame {
    /// The first four bytes are not the leading magic.
    LeadingMagic,
    /// The type byte is not a known packet ordinal.
    UnknownType(u8),
    /// The checksum field disagrees with the payload.
    Checksum { expected: u16, actual: u16 },
    /// The two bytes after the checksum are not the trailing magic.
    TrailingMagic,
}

/// Outcome of inspecting the start of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameStatus {
    /// A valid frame occupying the given number of bytes.
    Complete(Packet, usize),
    /// Too few bytes to decide; a valid frame may still be arriving.
    Incomplete,
    /// The buffer does not start with a valid frame.
    Invalid(InvalidFrame),
}

/// Inspect the frame at offset 0 of `src`.
///
/// A buffer shorter than [`MIN_FRAME_SIZE`], or one whose leading magic and
/// type byte look right but whose declared length runs past the end, is
/// `Incomplete`. Everything else that fails validation is `Invalid`.
pub fn probe(src: &[u8]) -> FrameStatus {
    if src.len() < MIN_FRAME_SIZE {
        return FrameStatus::Incomplete;
    }
    if src[..4] != LEADING_MAGIC {
        return FrameStatus::Invalid(InvalidFrame::LeadingMagic);
    }

    let Some(packet_type) = PacketType::from_u8(src[4]) else {
        return FrameStatus::Invalid(InvalidFrame::UnknownType(src[4]));
    };
    let sequence = u16::from_be_bytes([src[5], src[6]]);
    let payload_len = usize::from(u16::from_be_bytes([src[7], src[8]]));

    let total = MIN_FRAME_SIZE + payload_len;
    if src.len() < total {
        return FrameStatus::Incomplete;
    }

    let payload_end = HEADER_SIZE + payload_len;
    let payload = &src[HEADER_SIZE..payload_end];
    let actual = u16::from_be_bytes([src[payload_end], src[payload_end + 1]]);
    let expected = checksum(payload);
    if actual != expected {
        return FrameStatus::Invalid(InvalidFrame::Checksum { expected, actual });
    }
    if src[payload_end + 2..total] != TRAILING_MAGIC {
        return FrameStatus::Invalid(InvalidFrame::TrailingMagic);
    }

    let packet = Packet::from_wire(packet_type, sequence, Bytes::copy_from_slice(payload));
    FrameStatus::Complete(packet, total)
}

/// Decode one packet from the start of `src`.
///
/// Returns the packet and the number of bytes its frame occupied, or `None`
/// if `src` does not start with a complete, valid frame. Whether more data
/// could help is deliberately not reported here; see [`probe`].
pub fn decode(src: &[u8]) -> Option<(Packet, usize)> {
    match probe(src) {
        FrameStatus::Complete(packet, consumed) => Some((packet, consumed)),
        FrameStatus::Incomplete | FrameStatus::Invalid(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INIT_FRAME: [u8; 17] = [
        0xAA, 0xBB, 0xCC, 0xDD, 0x01, 0x00, 0x00, 0x00, 0x04, 0x49, 0x4E, 0x49, 0x54, 0x01, 0x31,
        0xEE, 0xFF,
    ];

    fn command(sequence: u16, payload: &'static [u8]) -> Packet {
        Packet::new(PacketType::Command, sequence, payload).unwrap()
    }

    #[test]
    fn encodes_init_command_bit_exact() {
        let wire = encode(&command(0, b"INIT"));
        assert_eq!(wire.as_ref(), &INIT_FRAME);
    }

    #[test]
    fn decodes_init_command() {
        let (packet, consumed) = decode(&INIT_FRAME).unwrap();
        assert_eq!(consumed, 17);
        assert_eq!(packet.packet_type(), PacketType::Command);
        assert_eq!(packet.sequence(), 0);
        assert_eq!(packet.payload().as_ref(), b"INIT");
    }

    #[test]
    fn encode_decode_roundtrip() {
        let packet = Packet::new(PacketType::Data, 0xBEEF, vec![0x10; 300]).unwrap();
        let wire = encode(&packet);

        assert_eq!(wire.len(), MIN_FRAME_SIZE + 300);
        assert_eq!(decode(&wire), Some((packet, wire.len())));
    }

    #[test]
    fn big_endian_header_fields() {
        let packet = Packet::new(PacketType::Response, 0x0102, vec![0u8; 0x0304]).unwrap();
        let wire = encode(&packet);
        assert_eq!(wire[4], 3);
        assert_eq!(&wire[5..7], &[0x01, 0x02]);
        assert_eq!(&wire[7..9], &[0x03, 0x04]);
    }

    #[test]
    fn empty_payload_is_minimum_frame() {
        let wire = encode(&Packet::heartbeat(7));
        assert_eq!(wire.len(), MIN_FRAME_SIZE);
        assert_eq!(
            wire.as_ref(),
            &[0xAA, 0xBB, 0xCC, 0xDD, 0x00, 0x00, 0x07, 0x00, 0x00, 0x00, 0x00, 0xEE, 0xFF]
        );
        let (packet, consumed) = decode(&wire).unwrap();
        assert!(packet.payload().is_empty());
        assert_eq!(consumed, MIN_FRAME_SIZE);
    }

    #[test]
    fn maximum_payload_roundtrip() {
        let packet = Packet::new(PacketType::Data, 1, vec![0xFF; MAX_PAYLOAD]).unwrap();
        let wire = encode(&packet);
        assert_eq!(wire.len(), MAX_FRAME_SIZE);
        // 65535 * 255 wraps; the checksum must still agree.
        let (decoded, consumed) = decode(&wire).unwrap();
        assert_eq!(consumed, MAX_FRAME_SIZE);
        assert_eq!(decoded.checksum(), packet.checksum());
    }

    #[test]
    fn encode_into_appends() {
        let mut buf = BytesMut::from(&b"prefix"[..]);
        encode_into(&command(1, b"x"), &mut buf);
        assert_eq!(&buf[..6], b"prefix");
        assert_eq!(buf.len(), 6 + MIN_FRAME_SIZE + 1);
    }

    #[test]
    fn decode_empty_and_short_input() {
        assert_eq!(decode(&[]), None);
        assert_eq!(probe(&[]), FrameStatus::Incomplete);
        assert_eq!(decode(&INIT_FRAME[..12]), None);
        assert_eq!(probe(&INIT_FRAME[..12]), FrameStatus::Incomplete);
    }

    #[test]
    fn truncated_payload_is_incomplete() {
        assert_eq!(decode(&INIT_FRAME[..16]), None);
        assert_eq!(probe(&INIT_FRAME[..16]), FrameStatus::Incomplete);
    }

    #[test]
    fn bad_leading_magic_is_invalid() {
        let mut wire = INIT_FRAME;
        wire[2] = 0x00;
        assert_eq!(decode(&wire), None);
        assert_eq!(probe(&wire), FrameStatus::Invalid(InvalidFrame::LeadingMagic));
    }

    #[test]
    fn unknown_type_is_invalid_even_when_truncated() {
        let mut wire = INIT_FRAME;
        wire[4] = 0x09;
        assert_eq!(
            probe(&wire),
            FrameStatus::Invalid(InvalidFrame::UnknownType(0x09))
        );
        assert_eq!(
            probe(&wire[..14]),
            FrameStatus::Invalid(InvalidFrame::UnknownType(0x09))
        );
    }

    #[test]
    fn checksum_mismatch_is_invalid() {
        let mut wire = INIT_FRAME;
        wire[10] ^= 0x01;
        assert_eq!(decode(&wire), None);
        assert!(matches!(
            probe(&wire),
            FrameStatus::Invalid(InvalidFrame::Checksum { actual: 0x0131, .. })
        ));
    }

    #[test]
    fn bad_trailing_magic_is_invalid() {
        let mut wire = INIT_FRAME;
        wire[16] = 0x00;
        assert_eq!(decode(&wire), None);
        assert_eq!(
            probe(&wire),
            FrameStatus::Invalid(InvalidFrame::TrailingMagic)
        );
    }

    #[test]
    fn compensating_errors_escape_the_checksum() {
        let mut wire = INIT_FRAME;
        wire[9] += 1;
        wire[10] -= 1;
        let (packet, _) = decode(&wire).expect("additive checksum cannot see this");
        assert_eq!(packet.payload().as_ref(), b"JMIT");
    }

    #[test]
    fn decode_stops_after_first_frame() {
        let mut wire = BytesMut::new();
        encode_into(&command(1, b"first"), &mut wire);
        encode_into(&command(2, b"second"), &mut wire);

        let (first, consumed) = decode(&wire).unwrap();
        assert_eq!(first.sequence(), 1);
        let (second, _) = decode(&wire[consumed..]).unwrap();
        assert_eq!(second.payload().as_ref(), b"second");
    }

    #[test]
    fn checksum_wraps() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0xFF; 257]), (0xFFu32 * 257 % 65536) as u16);
        assert_eq!(checksum(&vec![0xFF; 65535]), (0xFFu64 * 65535 % 65536) as u16);
    }
}
