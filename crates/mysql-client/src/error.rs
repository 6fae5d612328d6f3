//! Client error types.

use std::sync::Arc;

use mysql_protocol::{ErrPayload, ProtocolError};
use thiserror::Error;

/// Errors that can occur while executing a batch.
#[derive(Debug, Error)]
pub enum Error {
    /// A batch was used after being disposed.
    #[error("batch has been disposed")]
    ObjectDisposed,

    /// A pre-execution state guard was violated.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The requested operation is not supported by this core.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The external cancellation token fired.
    #[error("operation was cancelled")]
    Cancelled,

    /// Framing or payload anomaly; the session is considered poisoned.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The server returned an ERR payload.
    #[error("server error {code} ({sql_state}): {message}")]
    Server {
        /// Server error code.
        code: u16,
        /// Five-character SQLSTATE, empty for pre-4.1 servers.
        sql_state: String,
        /// Human-readable message.
        message: String,
    },

    /// Transport failure (wrapped in `Arc` for Clone support downstream).
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),
}

impl From<ErrPayload> for Error {
    fn from(e: ErrPayload) -> Self {
        Error::Server {
            code: e.code,
            sql_state: e.sql_state,
            message: e.message,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_from_payload() {
        let err: Error = ErrPayload {
            code: 1064,
            sql_state: "42000".into(),
            message: "syntax error".into(),
        }
        .into();
        assert!(matches!(err, Error::Server { code: 1064, .. }));
        assert!(err.to_string().contains("42000"));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(Error::ObjectDisposed.to_string(), "batch has been disposed");
        assert_eq!(Error::Cancelled.to_string(), "operation was cancelled");
    }
}
