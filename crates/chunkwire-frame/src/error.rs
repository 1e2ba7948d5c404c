/// Errors that can occur during packet construction, encoding and reassembly.
///
/// Malformed frames on the wire are not errors: the reassembler skips them.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload does not fit in the 16-bit length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// No complete frame was found within the reassembly ceiling; the buffer was reset.
    #[error("receive buffer overflow ({unframed} bytes without a complete frame, max {max})")]
    BufferOverflow { unframed: usize, max: usize },

    /// A byte outside the known packet type ordinals.
    #[error("unknown packet type {0:#04x}")]
    UnknownPacketType(u8),

    /// A packet type name that does not match any known type.
    #[error("unknown packet type name '{0}'")]
    UnknownPacketName(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An I/O error surfaced through the async codec.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
