//! Per-connection protocol sessions.
//!
//! A [`ProtocolSession`] is created for each connected device. It numbers
//! outgoing packets, reassembles inbound chunks into packets, and publishes
//! them in arrival order on a typed [`SessionEvents`] channel. There is no
//! process-wide state: whoever manages the connection owns its session.

pub mod dispatch;
pub mod error;
pub mod event;
pub mod pump;
pub mod session;

pub use dispatch::Dispatcher;
pub use error::{Result, SessionError};
pub use event::{InboundPacket, SessionEvent, SessionEvents};
pub use pump::{ChunkPump, PumpStats};
pub use session::{ProtocolSession, SessionConfig, DEFAULT_READ_CHUNK_SIZE};
