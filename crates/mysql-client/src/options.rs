//! Execution options: I/O mode and per-command behavior.

use bitflags::bitflags;

/// Default command timeout in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u32 = 30;

/// How I/O suspension points behave during execution.
///
/// The same code path serves both modes; the mode is carried as an explicit
/// parameter down to the session, which decides whether to complete each
/// operation inline or suspend at packet boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IoBehavior {
    /// Complete every I/O operation inline without suspension.
    Synchronous,
    /// Suspend at every packet boundary.
    #[default]
    Asynchronous,
}

bitflags! {
    /// Per-command behavior mask.
    ///
    /// `CLOSE_CONNECTION` is rejected by validation; the remaining flags
    /// narrow how the result reader is driven.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CommandBehavior: u8 {
        /// Return only the first result set.
        const SINGLE_RESULT = 0x01;
        /// Return at most one row of the first result set.
        const SINGLE_ROW = 0x08;
        /// Close the connection when the reader closes (not supported).
        const CLOSE_CONNECTION = 0x20;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_behavior_default() {
        assert_eq!(IoBehavior::default(), IoBehavior::Asynchronous);
    }

    #[test]
    fn test_behavior_default_is_empty() {
        assert!(CommandBehavior::default().is_empty());
    }
}
