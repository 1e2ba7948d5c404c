use std::fs;
use std::io::Read;
use std::time::SystemTime;

use chunkwire_frame::{FrameError, ReassemblerConfig, StreamReassembler};
use chunkwire_session::InboundPacket;
use tracing::{debug, warn};

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_overflow, print_packet, OutputFormat};

#[derive(Debug, Default, PartialEq, Eq)]
struct DecodeSummary {
    packets: usize,
    overflows: usize,
    leftover: usize,
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let (input, source) = read_input(&args)?;
    let chunk_size = match args.chunk {
        Some(0) => return Err(CliError::new(USAGE, "--chunk must be greater than zero")),
        Some(n) => n,
        None => input.len().max(1),
    };
    let config = ReassemblerConfig::default().with_max_buffer(args.max_buffer);
    config
        .validate()
        .map_err(|err| frame_error("invalid --max-buffer", err))?;

    let mut reassembler = StreamReassembler::with_config(config);
    let summary = decode_chunks(&mut reassembler, &input, chunk_size, |event| match event {
        Ok(packet) => print_packet(
            &InboundPacket::new(packet, SystemTime::now()),
            &source,
            format,
        ),
        Err(FrameError::BufferOverflow { unframed, max }) => {
            print_overflow(unframed, max, &source, format)
        }
        Err(err) => warn!(error = %err, "unexpected reassembly error"),
    });

    if summary.leftover > 0 {
        debug!(bytes = summary.leftover, "input ended inside an incomplete frame");
    }
    if summary.packets == 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("no packets decoded from {} bytes of {source}", input.len()),
        ));
    }
    Ok(SUCCESS)
}

fn read_input(args: &DecodeArgs) -> CliResult<(Vec<u8>, String)> {
    if let Some(digits) = &args.hex {
        return Ok((parse_hex(digits)?, "hex".to_string()));
    }
    if let Some(path) = &args.file {
        let bytes = fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        return Ok((bytes, path.display().to_string()));
    }
    let mut bytes = Vec::new();
    std::io::stdin()
        .read_to_end(&mut bytes)
        .map_err(|err| io_error("failed reading stdin", err))?;
    Ok((bytes, "stdin".to_string()))
}

fn decode_chunks<F>(
    reassembler: &mut StreamReassembler,
    input: &[u8],
    chunk_size: usize,
    mut on_result: F,
) -> DecodeSummary
where
    F: FnMut(Result<chunkwire_frame::Packet, FrameError>),
{
    let mut summary = DecodeSummary::default();
    for chunk in input.chunks(chunk_size) {
        for result in reassembler.feed(chunk) {
            match &result {
                Ok(_) => summary.packets += 1,
                Err(FrameError::BufferOverflow { .. }) => summary.overflows += 1,
                Err(_) => {}
            }
            on_result(result);
        }
    }
    summary.leftover = reassembler.len();
    summary
}

#[cfg(test)]
mod tests {
    use chunkwire_frame::{encode, Packet, PacketType};

    use super::*;

    fn init_frame() -> Vec<u8> {
        encode(&Packet::new(PacketType::Command, 0, &b"INIT"[..]).unwrap()).to_vec()
    }

    #[test]
    fn decodes_across_chunk_sizes() {
        let mut input = init_frame();
        input.extend_from_slice(&encode(&Packet::heartbeat(1)));
        for chunk_size in [1, 3, 5, 13, input.len()] {
            let mut reassembler = StreamReassembler::new();
            let mut sequences = Vec::new();
            let summary = decode_chunks(&mut reassembler, &input, chunk_size, |r| {
                sequences.push(r.unwrap().sequence())
            });
            assert_eq!(summary.packets, 2, "chunk size {chunk_size}");
            assert_eq!(sequences, vec![0, 1]);
            assert_eq!(summary.leftover, 0);
        }
    }

    #[test]
    fn reports_overflow_and_leftover() {
        let mut input = vec![0x11; 40];
        input.extend_from_slice(&init_frame()[..6]);
        let mut reassembler =
            StreamReassembler::with_config(ReassemblerConfig::default().with_max_buffer(32));
        let summary = decode_chunks(&mut reassembler, &input, 8, |_| {});
        assert_eq!(summary.packets, 0);
        assert_eq!(summary.overflows, 1);
        assert_eq!(summary.leftover, 6);
    }
}
