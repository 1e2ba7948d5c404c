use std::time::SystemTime;

use bytes::Bytes;
use chunkwire_frame::{FrameError, Packet, PacketType};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

/// A packet received on a session, stamped with its local receipt time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundPacket {
    pub packet_type: PacketType,
    /// Sequence number assigned by the sender.
    pub sequence: u16,
    pub payload: Bytes,
    /// When the frame completed in the receive buffer. Never transmitted.
    pub received_at: SystemTime,
}

impl InboundPacket {
    /// Stamp a decoded packet.
    pub fn new(packet: Packet, received_at: SystemTime) -> Self {
        let packet_type = packet.packet_type();
        let sequence = packet.sequence();
        Self {
            packet_type,
            sequence,
            payload: packet.into_payload(),
            received_at,
        }
    }

    /// The payload as UTF-8 text, if it is valid UTF-8.
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    /// Deserialize the payload as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.payload)
    }

    /// Split a `Response` built by [`ProtocolSession::reply`] into the
    /// request sequence it answers and the response body.
    ///
    /// [`ProtocolSession::reply`]: crate::ProtocolSession::reply
    pub fn response_parts(&self) -> Option<(u16, Bytes)> {
        if self.packet_type != PacketType::Response || self.payload.len() < 2 {
            return None;
        }
        let request = u16::from_be_bytes([self.payload[0], self.payload[1]]);
        Some((request, self.payload.slice(2..)))
    }
}

/// Something the application needs to know about a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A validated packet, in arrival order.
    Packet(InboundPacket),
    /// No frame completed within the reassembly ceiling; the receive buffer
    /// was reset. The link is delivering data this protocol cannot use.
    Overflow { unframed: usize, max: usize },
}

impl SessionEvent {
    /// The packet, if this is a packet event.
    pub fn into_packet(self) -> Option<InboundPacket> {
        match self {
            SessionEvent::Packet(packet) => Some(packet),
            SessionEvent::Overflow { .. } => None,
        }
    }

    pub(crate) fn from_overflow(err: &FrameError) -> Option<Self> {
        match *err {
            FrameError::BufferOverflow { unframed, max } => {
                Some(SessionEvent::Overflow { unframed, max })
            }
            _ => None,
        }
    }
}

/// Receiving half of a session's event channel.
///
/// Events arrive in the order the session produced them. The channel closes
/// when the session is dropped. Works with or without an async runtime.
#[derive(Debug)]
pub struct SessionEvents {
    rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl SessionEvents {
    pub(crate) fn channel() -> (mpsc::UnboundedSender<SessionEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// Next event if one is ready.
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next event; `None` once the session is gone.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.rx.recv().await
    }

    /// Blocking wait for the next event; `None` once the session is gone.
    ///
    /// Must not be called from inside an async runtime.
    pub fn blocking_recv(&mut self) -> Option<SessionEvent> {
        self.rx.blocking_recv()
    }

    /// Take every event that is ready right now.
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Number of events waiting.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether no events are waiting.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(feature = "async")]
impl futures_core::Stream for SessionEvents {
    type Item = SessionEvent;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
