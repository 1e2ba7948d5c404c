use std::collections::HashMap;
use std::fmt;

use chunkwire_frame::PacketType;
use tracing::trace;

use crate::event::{InboundPacket, SessionEvent, SessionEvents};

type PacketHandler = Box<dyn FnMut(&InboundPacket) + Send + 'static>;
type OverflowHandler = Box<dyn FnMut(usize, usize) + Send + 'static>;

/// Routes inbound packets to handlers by [`PacketType`].
///
/// Only the coarse type is used for routing; what a payload means is up to
/// the handler.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<PacketType, PacketHandler>,
    fallback: Option<PacketHandler>,
    overflow: Option<OverflowHandler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for `packet_type`, replacing any previous one.
    ///
    /// Returns true if a handler was replaced.
    pub fn register<F>(&mut self, packet_type: PacketType, handler: F) -> bool
    where
        F: FnMut(&InboundPacket) + Send + 'static,
    {
        self.handlers
            .insert(packet_type, Box::new(handler))
            .is_some()
    }

    /// Handler for packet types with no registered handler.
    pub fn on_unhandled<F>(&mut self, handler: F)
    where
        F: FnMut(&InboundPacket) + Send + 'static,
    {
        self.fallback = Some(Box::new(handler));
    }

    /// Handler for overflow events, called with `(unframed, max)`.
    pub fn on_overflow<F>(&mut self, handler: F)
    where
        F: FnMut(usize, usize) + Send + 'static,
    {
        self.overflow = Some(Box::new(handler));
    }

    /// Route one packet. Returns false if no handler (not even the fallback) ran.
    pub fn dispatch(&mut self, packet: &InboundPacket) -> bool {
        let handler = match self.handlers.get_mut(&packet.packet_type) {
            Some(handler) => handler,
            None => match self.fallback.as_mut() {
                Some(fallback) => fallback,
                None => {
                    trace!(packet_type = %packet.packet_type, "no handler for packet");
                    return false;
                }
            },
        };
        handler(packet);
        true
    }

    /// Route one session event.
    pub fn dispatch_event(&mut self, event: &SessionEvent) -> bool {
        match event {
            SessionEvent::Packet(packet) => self.dispatch(packet),
            SessionEvent::Overflow { unframed, max } => match self.overflow.as_mut() {
                Some(handler) => {
                    handler(*unframed, *max);
                    true
                }
                None => false,
            },
        }
    }

    /// Route every event that is ready on `events`. Returns how many were handled.
    pub fn dispatch_ready(&mut self, events: &mut SessionEvents) -> usize {
        let mut handled = 0;
        while let Some(event) = events.try_recv() {
            if self.dispatch_event(&event) {
                handled += 1;
            }
        }
        handled
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut registered: Vec<PacketType> = self.handlers.keys().copied().collect();
        registered.sort();
        f.debug_struct("Dispatcher")
            .field("registered", &registered)
            .field("fallback", &self.fallback.is_some())
            .field("overflow", &self.overflow.is_some())
            .finish()
    }
}
