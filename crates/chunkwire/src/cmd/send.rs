use std::time::Duration;

use chunkwire_session::{ChunkPump, InboundPacket, ProtocolSession, SessionEvent, SessionEvents};
use chunkwire_transport::{IoTransport, UnixDomainSocket};
use tracing::{debug, warn};

use crate::cmd::SendArgs;
use crate::exit::{session_error, transport_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{print_overflow, print_packet, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let payload = args.payload.resolve()?;

    let stream = UnixDomainSocket::connect(&args.path)
        .map_err(|err| transport_error("connect failed", err))?;
    let writer = stream
        .try_clone()
        .map_err(|err| transport_error("socket setup failed", err))?;
    let (mut session, mut events) = ProtocolSession::new(IoTransport::new(writer));

    let sequence = session
        .send(args.packet_type, &payload)
        .map_err(|err| session_error("send failed", err))?;
    debug!(
        packet_type = %args.packet_type,
        sequence,
        len = payload.len(),
        "sent"
    );

    if !args.wait {
        return Ok(SUCCESS);
    }

    stream
        .set_read_timeout(Some(wait_timeout))
        .map_err(|err| transport_error("socket setup failed", err))?;
    let source = args.path.display().to_string();
    let mut pump = ChunkPump::for_session(stream, &session)
        .map_err(|err| session_error("session setup failed", err))?;

    loop {
        let more = pump
            .pump_once(&mut session)
            .map_err(|err| session_error("receive failed", err))?;
        if let Some(packet) = first_packet(&mut events, &source, format) {
            print_packet(&packet, &source, format);
            return Ok(SUCCESS);
        }
        if more.is_none() {
            return Err(CliError::new(
                FAILURE,
                "receive failed: peer closed the connection before replying",
            ));
        }
    }
}

/// Take the first packet from `events`, reporting any overflow before it.
fn first_packet(
    events: &mut SessionEvents,
    source: &str,
    format: OutputFormat,
) -> Option<InboundPacket> {
    while let Some(event) = events.try_recv() {
        match event {
            SessionEvent::Packet(packet) => return Some(packet),
            SessionEvent::Overflow { unframed, max } => {
                warn!(unframed, max, "reply stream overflowed");
                print_overflow(unframed, max, source, format);
            }
        }
    }
    None
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(num) => (num, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use chunkwire_frame::{Packet, PacketType};
    use chunkwire_transport::MemoryTransport;

    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn first_packet_skips_overflow_events() {
        let (mut session, mut events) = ProtocolSession::with_config(
            MemoryTransport::new(),
            chunkwire_session::SessionConfig::default().with_max_buffer(16),
        )
        .unwrap();
        session.on_chunk(&[0u8; 20]);
        session.on_chunk(&chunkwire_frame::encode(
            &Packet::new(PacketType::Response, 3, &b"ok"[..]).unwrap(),
        ));

        let packet = first_packet(&mut events, "test", OutputFormat::Json).unwrap();
        assert_eq!(packet.sequence, 3);
        assert!(first_packet(&mut events, "test", OutputFormat::Json).is_none());
    }
}
