use bytes::{Buf, BytesMut};
use tracing::{debug, trace, warn};

use crate::codec::{probe, FrameStatus, MAX_FRAME_SIZE};
use crate::error::{FrameError, Result};
use crate::packet::Packet;

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// Default reassembly ceiling: 128 KiB.
///
/// Larger than [`MAX_FRAME_SIZE`], so a maximum-size frame that trickles in
/// one byte at a time is never mistaken for a runaway sender.
pub const DEFAULT_MAX_BUFFER: usize = 128 * 1024;

/// Configuration for a [`StreamReassembler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassemblerConfig {
    /// Bytes that may arrive without completing a frame before the buffer is
    /// reset and an overflow is reported. Default: 128 KiB.
    pub max_buffer: usize,
}

impl Default for ReassemblerConfig {
    fn default() -> Self {
        Self {
            max_buffer: DEFAULT_MAX_BUFFER,
        }
    }
}

impl ReassemblerConfig {
    /// Override the reassembly ceiling.
    pub fn with_max_buffer(mut self, max_buffer: usize) -> Self {
        self.max_buffer = max_buffer;
        self
    }

    /// Reject values that would make the reassembler unusable.
    pub fn validate(&self) -> Result<()> {
        if self.max_buffer == 0 {
            return Err(FrameError::InvalidConfig(
                "max_buffer must be greater than zero".to_string(),
            ));
        }
        if self.max_buffer < MAX_FRAME_SIZE {
            debug!(
                max_buffer = self.max_buffer,
                max_frame = MAX_FRAME_SIZE,
                "reassembly ceiling is below the largest frame; large frames will overflow"
            );
        }
        Ok(())
    }
}

/// Turns arbitrarily chunked bytes back into packets.
///
/// Chunks are appended to an internal buffer and complete frames are peeled
/// off the front. When the front of the buffer cannot start a valid frame,
/// exactly one byte is dropped and decoding is retried, so any run of
/// garbage is eventually skipped and alignment is recovered at the next
/// leading magic. Corrupt frames are never reported; only a stream that
/// produces no frame within [`ReassemblerConfig::max_buffer`] bytes is.
///
/// The buffer is not synchronized: all `feed` calls for one stream must
/// happen in order from one owner.
#[derive(Debug)]
pub struct StreamReassembler {
    buf: BytesMut,
    config: ReassemblerConfig,
    unframed: usize,
}

impl Default for StreamReassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamReassembler {
    /// Create a reassembler with default configuration.
    pub fn new() -> Self {
        Self::with_config(ReassemblerConfig::default())
    }

    /// Create a reassembler with explicit configuration.
    pub fn with_config(config: ReassemblerConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            unframed: 0,
        }
    }

    /// Append a chunk and return the packets it completes.
    ///
    /// The iterator is lazy: frames are decoded as it is advanced. Frames it
    /// was not advanced over stay buffered and come out of the next `feed`,
    /// which may be called with an empty chunk for that purpose.
    ///
    /// An `Err(FrameError::BufferOverflow)` item means the buffer was reset.
    pub fn feed(&mut self, chunk: &[u8]) -> Packets<'_> {
        self.buf.extend_from_slice(chunk);
        self.unframed = self.unframed.saturating_add(chunk.len());
        Packets { reassembler: self }
    }

    /// Run the reassembly loop until it yields a packet, an overflow, or stalls.
    pub fn next_packet(&mut self) -> Option<Result<Packet>> {
        next_frame(&mut self.buf, &mut self.unframed, self.config.max_buffer)
    }

    /// Bytes currently buffered.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Discard buffered bytes, e.g. when the connection is torn down.
    pub fn clear(&mut self) {
        if !self.buf.is_empty() {
            debug!(discarded = self.buf.len(), "clearing receive buffer");
        }
        self.buf.clear();
        self.unframed = 0;
    }

    /// Current configuration.
    pub fn config(&self) -> &ReassemblerConfig {
        &self.config
    }
}

/// Lazy sequence of packets completed by one [`StreamReassembler::feed`].
#[must_use = "packets are only decoded when the iterator is advanced"]
#[derive(Debug)]
pub struct Packets<'a> {
    reassembler: &'a mut StreamReassembler,
}

impl Iterator for Packets<'_> {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reassembler.next_packet()
    }
}

/// One pass of the reassembly loop over `buf`.
///
/// `unframed` counts bytes received since the last complete frame; when the
/// loop stalls with more than `max_buffer` of them, the buffer is reset.
pub(crate) fn next_frame(
    buf: &mut BytesMut,
    unframed: &mut usize,
    max_buffer: usize,
) -> Option<Result<Packet>> {
    loop {
        match probe(buf) {
            FrameStatus::Complete(packet, consumed) => {
                buf.advance(consumed);
                *unframed = buf.len();
                debug!(
                    packet_type = %packet.packet_type(),
                    sequence = packet.sequence(),
                    len = packet.payload().len(),
                    "frame reassembled"
                );
                return Some(Ok(packet));
            }
            FrameStatus::Incomplete => {
                if *unframed > max_buffer {
                    let overflowed = *unframed;
                    warn!(
                        unframed = overflowed,
                        max = max_buffer,
                        "no complete frame within buffer ceiling; resetting"
                    );
                    buf.clear();
                    *unframed = 0;
                    return Some(Err(FrameError::BufferOverflow {
                        unframed: overflowed,
                        max: max_buffer,
                    }));
                }
                return None;
            }
            FrameStatus::Invalid(reason) => {
                trace!(?reason, buffered = buf.len(), "resync: dropping one byte");
                buf.advance(1);
            }
        }
    }
}
