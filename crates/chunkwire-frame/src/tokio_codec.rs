//! `tokio_util::codec` adapter for async byte streams.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::codec::encode_into;
use crate::error::FrameError;
use crate::packet::Packet;
use crate::reassembler::{next_frame, ReassemblerConfig};

/// Framing codec with the same resync and overflow behavior as
/// [`StreamReassembler`](crate::StreamReassembler), for use with
/// `FramedRead`/`FramedWrite`.
///
/// Overflow is returned as a decode error, which ends a `FramedRead` stream.
#[derive(Debug, Default)]
pub struct PacketCodec {
    config: ReassemblerConfig,
    unframed: usize,
    retained: usize,
}

impl PacketCodec {
    /// Create a codec with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with explicit configuration.
    pub fn with_config(config: ReassemblerConfig) -> Self {
        Self {
            config,
            unframed: 0,
            retained: 0,
        }
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, FrameError> {
        // `src` only grows between calls, so anything beyond what we left is new.
        let arrived = src.len().saturating_sub(self.retained);
        self.unframed = self.unframed.saturating_add(arrived);

        let step = next_frame(src, &mut self.unframed, self.config.max_buffer);
        self.retained = src.len();
        step.transpose()
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, FrameError> {
        if let Some(packet) = self.decode(src)? {
            return Ok(Some(packet));
        }
        if !src.is_empty() {
            debug!(discarded = src.len(), "stream ended with a partial frame");
            src.clear();
            self.retained = 0;
            self.unframed = 0;
        }
        Ok(None)
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_into(&item, dst);
        Ok(())
    }
}

impl Encoder<&Packet> for PacketCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &Packet, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_into(item, dst);
        Ok(())
    }
}
