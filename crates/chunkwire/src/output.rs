use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use chunkwire_frame::{checksum, Packet};
use chunkwire_session::InboundPacket;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    event: &'static str,
    packet_type: &'static str,
    type_code: u8,
    sequence: u16,
    payload_size: usize,
    checksum: u16,
    payload: String,
    source: &'a str,
    received_at: String,
}

#[derive(Serialize)]
struct OverflowOutput<'a> {
    event: &'static str,
    unframed: usize,
    max: usize,
    source: &'a str,
}

#[derive(Serialize)]
struct FrameOutput {
    packet_type: &'static str,
    sequence: u16,
    payload_size: usize,
    checksum: u16,
    frame_size: usize,
    hex: String,
}

/// Print one received packet. `source` names where it came from (socket path,
/// input file, `stdin`).
pub fn print_packet(packet: &InboundPacket, source: &str, format: OutputFormat) {
    let payload = packet.payload.as_ref();
    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                event: "packet",
                packet_type: packet.packet_type.name(),
                type_code: packet.packet_type.as_u8(),
                sequence: packet.sequence,
                payload_size: payload.len(),
                checksum: checksum(payload),
                payload: payload_preview(payload),
                source,
                received_at: unix_seconds(packet.received_at),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "SEQ", "SIZE", "SOURCE", "PAYLOAD"])
                .add_row(vec![
                    packet.packet_type.name().to_string(),
                    packet.sequence.to_string(),
                    payload.len().to_string(),
                    source.to_string(),
                    payload_preview(payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "type={} ({}) seq={} size={} source={} payload={}",
                packet.packet_type.as_u8(),
                packet.packet_type.name(),
                packet.sequence,
                payload.len(),
                source,
                payload_preview(payload)
            );
        }
        OutputFormat::Raw => print_raw(payload),
    }
}

/// Report a reassembly overflow. Raw output has no place for it, so it goes
/// to stderr in that mode.
pub fn print_overflow(unframed: usize, max: usize, source: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = OverflowOutput {
                event: "overflow",
                unframed,
                max,
                source,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("overflow: {unframed} bytes without a frame (max {max}) source={source}");
        }
        OutputFormat::Raw => {
            eprintln!("overflow: {unframed} bytes without a frame (max {max}) source={source}");
        }
    }
}

/// Print an encoded frame.
pub fn print_frame(packet: &Packet, wire: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                packet_type: packet.packet_type().name(),
                sequence: packet.sequence(),
                payload_size: packet.payload().len(),
                checksum: packet.checksum(),
                frame_size: wire.len(),
                hex: hex::encode(wire),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "SEQ", "SIZE", "CHECKSUM", "FRAME"])
                .add_row(vec![
                    packet.packet_type().name().to_string(),
                    packet.sequence().to_string(),
                    packet.payload().len().to_string(),
                    format!("{:#06x}", packet.checksum()),
                    spaced_hex(wire),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", spaced_hex(wire)),
        OutputFormat::Raw => print_raw(wire),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Upper-case hex with a space between bytes (`AA BB CC DD`).
pub fn spaced_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes: {}>", payload.len(), hex::encode(payload)),
    }
}

fn unix_seconds(at: SystemTime) -> String {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaced_hex_matches_wire_notation() {
        assert_eq!(spaced_hex(&[0xAA, 0xBB, 0x01, 0xEE]), "AA BB 01 EE");
        assert_eq!(spaced_hex(&[]), "");
    }

    #[test]
    fn binary_payload_preview_shows_hex() {
        assert_eq!(payload_preview(b"INIT"), "INIT");
        assert_eq!(payload_preview(&[0xFF, 0x00]), "<binary 2 bytes: ff00>");
    }
}
