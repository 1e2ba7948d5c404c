use chunkwire_session::{InboundPacket, ProtocolSession, SessionEvent};
use chunkwire_transport::Transport;
use tracing::{info, warn};

use crate::cmd::serve::{serve, Flow};
use crate::cmd::{type_allowed, EchoArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: EchoArgs, _format: OutputFormat) -> CliResult<i32> {
    serve(&args.path, |session, event| {
        match event {
            SessionEvent::Packet(packet) => {
                if type_allowed(args.types.as_deref(), packet.packet_type) {
                    answer(session, &packet);
                }
            }
            SessionEvent::Overflow { unframed, max } => {
                warn!(unframed, max, "receive buffer overflow");
            }
        }
        Ok(Flow::Continue)
    })?;

    Ok(SUCCESS)
}

/// Reply with the request's payload. A reply that cannot be sent only costs
/// that reply; the server keeps serving.
fn answer<T: Transport>(session: &mut ProtocolSession<T>, packet: &InboundPacket) -> bool {
    info!(
        packet_type = %packet.packet_type,
        sequence = packet.sequence,
        size = packet.payload.len(),
        "echoing packet"
    );
    match session.reply(packet, &packet.payload) {
        Ok(_) => true,
        Err(err) => {
            warn!(
                packet_type = %packet.packet_type,
                sequence = packet.sequence,
                error = %err,
                "echo reply failed"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use chunkwire_frame::{Packet, PacketType, MAX_PAYLOAD};
    use chunkwire_transport::MemoryTransport;

    use super::*;

    fn request(sequence: u16, payload: Vec<u8>) -> InboundPacket {
        InboundPacket::new(
            Packet::new(PacketType::Data, sequence, payload).unwrap(),
            SystemTime::now(),
        )
    }

    #[test]
    fn oversized_reply_is_skipped_and_next_request_answered() {
        let link = MemoryTransport::new();
        let (mut session, _events) = ProtocolSession::new(link.clone());

        assert!(!answer(&mut session, &request(0, vec![7u8; MAX_PAYLOAD - 1])));
        assert!(!answer(&mut session, &request(1, vec![7u8; MAX_PAYLOAD])));
        assert!(answer(&mut session, &request(2, b"ping".to_vec())));

        let (mut receiver, mut events) = ProtocolSession::new(MemoryTransport::new());
        receiver.on_chunk(&link.wire());
        let replies: Vec<InboundPacket> = events
            .drain()
            .into_iter()
            .filter_map(SessionEvent::into_packet)
            .collect();
        assert_eq!(replies.len(), 1);
        let (request_sequence, body) = replies[0].response_parts().unwrap();
        assert_eq!(request_sequence, 2);
        assert_eq!(&body[..], b"ping");
    }

    #[test]
    fn transport_failure_does_not_stop_echo() {
        let link = MemoryTransport::new();
        let (mut session, _events) = ProtocolSession::new(link.clone());
        link.fail_next(1);

        assert!(!answer(&mut session, &request(0, b"lost".to_vec())));
        assert!(answer(&mut session, &request(1, b"kept".to_vec())));
        assert_eq!(link.frame_count(), 1);
    }
}
