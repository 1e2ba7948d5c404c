use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// In-memory transport that records everything sent through it.
///
/// Clones share the same state, so a test can hand one clone to a session
/// and inspect the wire through another. With an MTU set, each frame is also
/// recorded as the sequence of link-sized chunks a BLE or serial link would
/// deliver, which is what a receiving session sees.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    frames: Vec<Bytes>,
    chunks: Vec<Bytes>,
    mtu: Option<usize>,
    failures_pending: usize,
    closed: bool,
}

impl MemoryTransport {
    /// Create an empty transport with no MTU limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport that splits every frame into chunks of at most `mtu` bytes.
    ///
    /// An MTU of zero is treated as unlimited.
    pub fn with_mtu(mtu: usize) -> Self {
        let transport = Self::default();
        transport.lock().mtu = (mtu > 0).then_some(mtu);
        transport
    }

    /// Make the next `count` sends fail with [`TransportError::Rejected`].
    pub fn fail_next(&self, count: usize) {
        self.lock().failures_pending = count;
    }

    /// Close the transport; every later send fails with [`TransportError::Closed`].
    pub fn close(&self) {
        self.lock().closed = true;
    }

    /// Frames sent so far, one entry per successful `send`.
    pub fn frames(&self) -> Vec<Bytes> {
        self.lock().frames.clone()
    }

    /// Link-sized chunks sent so far, in transmission order.
    pub fn chunks(&self) -> Vec<Bytes> {
        self.lock().chunks.clone()
    }

    /// Remove and return the pending chunks, as a receiver would drain them.
    pub fn take_chunks(&self) -> Vec<Bytes> {
        std::mem::take(&mut self.lock().chunks)
    }

    /// Everything sent so far as one contiguous byte string.
    pub fn wire(&self) -> Vec<u8> {
        self.lock()
            .frames
            .iter()
            .flat_map(|frame| frame.iter().copied())
            .collect()
    }

    /// Number of frames sent so far.
    pub fn frame_count(&self) -> usize {
        self.lock().frames.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        if state.failures_pending > 0 {
            state.failures_pending -= 1;
            debug!(len = bytes.len(), "memory transport rejecting frame");
            return Err(TransportError::Rejected("injected failure".to_string()));
        }

        let frame = Bytes::copy_from_slice(bytes);
        match state.mtu {
            Some(mtu) => {
                let mut offset = 0;
                while offset < frame.len() {
                    let end = (offset + mtu).min(frame.len());
                    state.chunks.push(frame.slice(offset..end));
                    offset = end;
                }
            }
            None => state.chunks.push(frame.clone()),
        }
        state.frames.push(frame);
        Ok(())
    }
}
