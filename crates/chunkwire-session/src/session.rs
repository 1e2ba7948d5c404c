use std::time::SystemTime;

use bytes::BytesMut;
use chunkwire_frame::{
    encode_into, Packet, PacketType, ReassemblerConfig, StreamReassembler, MAX_PAYLOAD,
};
use chunkwire_transport::Transport;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Result, SessionError};
use crate::event::{InboundPacket, SessionEvent, SessionEvents};

/// Default size of each read performed by [`ChunkPump`](crate::ChunkPump).
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4 * 1024;

/// Session behavior config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Receive-side reassembly limits.
    pub reassembler: ReassemblerConfig,
    /// Read size used when pumping a `Read` source into the session.
    pub read_chunk_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reassembler: ReassemblerConfig::default(),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

impl SessionConfig {
    /// Override the reassembly ceiling.
    pub fn with_max_buffer(mut self, max_buffer: usize) -> Self {
        self.reassembler.max_buffer = max_buffer;
        self
    }

    /// Override the pump read size.
    pub fn with_read_chunk_size(mut self, read_chunk_size: usize) -> Self {
        self.read_chunk_size = read_chunk_size;
        self
    }

    /// Reject values that would make the session unusable.
    pub fn validate(&self) -> Result<()> {
        self.reassembler.validate()?;
        if self.read_chunk_size == 0 {
            return Err(SessionError::InvalidConfig(
                "read_chunk_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Protocol state for one connected device.
///
/// Owns the transport's outbound half, the receive buffer and the outgoing
/// sequence counter. `send` and `on_chunk` take `&mut self`, so calls on one
/// session are serialized by construction; independent sessions share nothing.
pub struct ProtocolSession<T> {
    transport: T,
    reassembler: StreamReassembler,
    next_sequence: u16,
    events: mpsc::UnboundedSender<SessionEvent>,
    encode_buf: BytesMut,
    config: SessionConfig,
}

impl<T: Transport> ProtocolSession<T> {
    /// Create a session with default configuration.
    ///
    /// Returns the session and the receiving end of its event channel.
    pub fn new(transport: T) -> (Self, SessionEvents) {
        Self::build(transport, SessionConfig::default())
    }

    /// Create a session with explicit configuration.
    pub fn with_config(transport: T, config: SessionConfig) -> Result<(Self, SessionEvents)> {
        config.validate()?;
        Ok(Self::build(transport, config))
    }

    fn build(transport: T, config: SessionConfig) -> (Self, SessionEvents) {
        let (events, rx) = SessionEvents::channel();
        let session = Self {
            transport,
            reassembler: StreamReassembler::with_config(config.reassembler.clone()),
            next_sequence: 0,
            events,
            encode_buf: BytesMut::new(),
            config,
        };
        (session, rx)
    }

    /// Send one packet and return the sequence number it carried.
    ///
    /// Payloads over 65535 bytes are rejected before a sequence number is
    /// taken. Once taken, a sequence number is spent even if the transport
    /// then fails; nothing is retried.
    pub fn send(&mut self, packet_type: PacketType, payload: &[u8]) -> Result<u16> {
        if payload.len() > MAX_PAYLOAD {
            return Err(SessionError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD,
            });
        }

        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);

        let packet = Packet::new(packet_type, sequence, payload.to_vec())?;
        self.encode_buf.clear();
        encode_into(&packet, &mut self.encode_buf);

        if let Err(err) = self.transport.send(&self.encode_buf) {
            warn!(
                packet_type = %packet_type,
                sequence,
                error = %err,
                "transport send failed"
            );
            return Err(err.into());
        }

        debug!(
            packet_type = %packet_type,
            sequence,
            len = payload.len(),
            "packet sent"
        );
        Ok(sequence)
    }

    /// Send a heartbeat with an empty payload.
    pub fn send_heartbeat(&mut self) -> Result<u16> {
        self.send(PacketType::Heartbeat, &[])
    }

    /// Send a text command.
    pub fn send_command(&mut self, text: &str) -> Result<u16> {
        self.send(PacketType::Command, text.as_bytes())
    }

    /// Serialize `value` as JSON and send it as a `Data` packet.
    pub fn send_json<V: Serialize + ?Sized>(&mut self, value: &V) -> Result<u16> {
        let payload = serde_json::to_vec(value)?;
        self.send(PacketType::Data, &payload)
    }

    /// Answer `request` with a `Response` whose payload starts with the
    /// request's sequence number (big-endian), followed by `body`.
    pub fn reply(&mut self, request: &InboundPacket, body: &[u8]) -> Result<u16> {
        let mut payload = Vec::with_capacity(2 + body.len());
        payload.extend_from_slice(&request.sequence.to_be_bytes());
        payload.extend_from_slice(body);
        self.send(PacketType::Response, &payload)
    }
}

impl<T> ProtocolSession<T> {
    /// Feed a chunk received from the transport.
    ///
    /// Every packet it completes is published as [`SessionEvent::Packet`];
    /// a reassembly overflow is published as [`SessionEvent::Overflow`].
    /// Corrupt data is skipped silently. Never blocks. Returns the number of
    /// events published.
    pub fn on_chunk(&mut self, chunk: &[u8]) -> usize {
        let mut published = 0;
        for item in self.reassembler.feed(chunk) {
            let event = match item {
                Ok(packet) => SessionEvent::Packet(InboundPacket::new(packet, SystemTime::now())),
                Err(err) => match SessionEvent::from_overflow(&err) {
                    Some(event) => event,
                    None => {
                        warn!(error = %err, "unexpected reassembly error");
                        continue;
                    }
                },
            };
            if self.events.send(event).is_err() {
                debug!("event receiver dropped; discarding event");
            }
            published += 1;
        }
        published
    }

    /// Forget all connection state: buffered bytes and the sequence counter.
    ///
    /// Call when the underlying connection is torn down so partial data from
    /// the old link cannot be read as part of the next one.
    pub fn reset(&mut self) {
        self.reassembler.clear();
        self.next_sequence = 0;
        debug!("session reset");
    }

    /// Sequence number the next `send` will use.
    pub fn next_sequence(&self) -> u16 {
        self.next_sequence
    }

    /// Bytes waiting in the receive buffer.
    pub fn buffered(&self) -> usize {
        self.reassembler.len()
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the session and return the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }
}

impl<T> std::fmt::Debug for ProtocolSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolSession")
            .field("next_sequence", &self.next_sequence)
            .field("buffered", &self.reassembler.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
