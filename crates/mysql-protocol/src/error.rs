//! Protocol error types.

use thiserror::Error;

/// Errors raised while encoding or decoding wire payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A payload grew past the configured hard limit.
    #[error("payload exceeds the configured limit of {limit} bytes")]
    BufferOverflow {
        /// The writer's hard limit in bytes.
        limit: usize,
    },

    /// A payload ended before a complete value could be read.
    #[error("truncated payload: needed {expected} bytes, {actual} available")]
    Truncated {
        /// Bytes required by the decoder.
        expected: usize,
        /// Bytes actually remaining.
        actual: usize,
    },

    /// A payload did not match its expected shape.
    #[error("malformed {0} payload")]
    Malformed(&'static str),

    /// A column definition carried an unknown type byte.
    #[error("unknown column type 0x{0:02X}")]
    UnknownColumnType(u8),

    /// A string field was not valid UTF-8.
    #[error("invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
