//! Command opcodes and server status flags.

use bitflags::bitflags;

/// MySQL/MariaDB command opcodes.
///
/// The opcode is the first byte of every client-to-server command payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandKind {
    /// COM_QUIT.
    Quit = 0x01,
    /// COM_INIT_DB.
    InitDb = 0x02,
    /// COM_QUERY, text protocol statement execution.
    Query = 0x03,
    /// COM_STATISTICS.
    Statistics = 0x09,
    /// COM_PING.
    Ping = 0x0E,
    /// COM_CHANGE_USER.
    ChangeUser = 0x11,
    /// COM_STMT_PREPARE, server-side statement preparation.
    StatementPrepare = 0x16,
    /// COM_STMT_EXECUTE, binary protocol execution of a prepared statement.
    StatementExecute = 0x17,
    /// COM_STMT_SEND_LONG_DATA.
    StatementSendLongData = 0x18,
    /// COM_STMT_CLOSE.
    StatementClose = 0x19,
    /// COM_STMT_RESET.
    StatementReset = 0x1A,
    /// COM_SET_OPTION.
    SetOption = 0x1B,
    /// COM_RESET_CONNECTION.
    ResetConnection = 0x1F,
    /// COM_MULTI (MariaDB), wraps several commands in one payload.
    Multi = 0xFE,
}

bitflags! {
    /// Server status flags carried in OK and EOF payloads.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ServerStatus: u16 {
        /// A transaction is active.
        const IN_TRANS = 0x0001;
        /// Autocommit mode is enabled.
        const AUTOCOMMIT = 0x0002;
        /// Another result set follows this one in the same response stream.
        const MORE_RESULTS_EXISTS = 0x0008;
        /// A cursor exists for the last statement.
        const CURSOR_EXISTS = 0x0040;
        /// The last row of the open cursor has been sent.
        const LAST_ROW_SENT = 0x0080;
        /// Session state information follows.
        const SESSION_STATE_CHANGED = 0x4000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_values() {
        assert_eq!(CommandKind::Query as u8, 0x03);
        assert_eq!(CommandKind::StatementPrepare as u8, 0x16);
        assert_eq!(CommandKind::StatementExecute as u8, 0x17);
        assert_eq!(CommandKind::Multi as u8, 0xFE);
    }

    #[test]
    fn test_more_results_flag() {
        let status = ServerStatus::from_bits_truncate(0x000A);
        assert!(status.contains(ServerStatus::MORE_RESULTS_EXISTS));
        assert!(status.contains(ServerStatus::AUTOCOMMIT));
        assert!(!status.contains(ServerStatus::IN_TRANS));
    }
}
