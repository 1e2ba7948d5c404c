/// Errors that can occur in session operations.
///
/// Corrupted inbound data never appears here; the reassembler absorbs it.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The transport failed to send a frame.
    #[error("transport error: {0}")]
    Transport(#[from] chunkwire_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] chunkwire_frame::FrameError),

    /// The payload cannot be encoded in a single packet.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading inbound chunks failed.
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
