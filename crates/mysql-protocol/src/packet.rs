//! Response payload parsing.
//!
//! The session layer strips the 4-byte frame header; everything here
//! operates on a single packet payload.

use bytes::{Buf, Bytes};

use crate::codec::{read_lenenc_int, read_u8, read_u16_le};
use crate::command::ServerStatus;
use crate::error::{ProtocolError, Result};

/// An OK payload (header byte 0x00, or 0xFE in its `CLIENT_DEPRECATE_EOF`
/// result-set-terminator form).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OkPayload {
    /// Rows affected by the statement.
    pub affected_rows: u64,
    /// Last AUTO_INCREMENT value generated, 0 if none.
    pub last_insert_id: u64,
    /// Server status flags.
    pub status: ServerStatus,
    /// Warning count.
    pub warnings: u16,
}

impl OkPayload {
    /// Parse an OK payload.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut src = Bytes::copy_from_slice(payload);
        let header = read_u8(&mut src)?;
        if header != 0x00 && header != 0xFE {
            return Err(ProtocolError::Malformed("OK"));
        }

        // The legacy EOF form carries only warnings and status.
        if header == 0xFE && payload.len() < 9 {
            let warnings = read_u16_le(&mut src)?;
            let status = ServerStatus::from_bits_truncate(read_u16_le(&mut src)?);
            return Ok(Self {
                affected_rows: 0,
                last_insert_id: 0,
                status,
                warnings,
            });
        }

        let affected_rows = read_lenenc_int(&mut src)?;
        let last_insert_id = read_lenenc_int(&mut src)?;
        let status = ServerStatus::from_bits_truncate(read_u16_le(&mut src)?);
        let warnings = if src.remaining() >= 2 {
            read_u16_le(&mut src)?
        } else {
            0
        };
        Ok(Self {
            affected_rows,
            last_insert_id,
            status,
            warnings,
        })
    }

    /// Whether another result set follows in the same response stream.
    #[must_use]
    pub fn more_results(&self) -> bool {
        self.status.contains(ServerStatus::MORE_RESULTS_EXISTS)
    }
}

/// An ERR payload (header byte 0xFF).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrPayload {
    /// Server error code.
    pub code: u16,
    /// Five-character SQLSTATE, empty for pre-4.1 servers.
    pub sql_state: String,
    /// Human-readable message.
    pub message: String,
}

impl ErrPayload {
    /// Parse an ERR payload.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut src = Bytes::copy_from_slice(payload);
        if read_u8(&mut src)? != 0xFF {
            return Err(ProtocolError::Malformed("ERR"));
        }
        let code = read_u16_le(&mut src)?;

        let sql_state = if src.first() == Some(&b'#') {
            src.advance(1);
            if src.remaining() < 5 {
                return Err(ProtocolError::Truncated {
                    expected: 5,
                    actual: src.remaining(),
                });
            }
            let state = src.split_to(5);
            String::from_utf8(state.to_vec()).map_err(|_| ProtocolError::InvalidUtf8("SQLSTATE"))?
        } else {
            String::new()
        };

        let message =
            String::from_utf8(src.to_vec()).map_err(|_| ProtocolError::InvalidUtf8("ERR message"))?;
        Ok(Self {
            code,
            sql_state,
            message,
        })
    }
}

/// The first payload of a statement response.
#[derive(Debug)]
pub enum QueryResponse {
    /// The statement produced no rows.
    Ok(OkPayload),
    /// The statement failed server-side.
    Err(ErrPayload),
    /// A result set follows; the payload holds the column count.
    ResultSet {
        /// Number of column definitions that follow.
        column_count: u64,
    },
    /// The server requested LOCAL INFILE data (not supported by this core).
    LocalInfile,
}

impl QueryResponse {
    /// Dispatch on the first payload of a statement response.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        match payload.first() {
            None => Err(ProtocolError::Truncated {
                expected: 1,
                actual: 0,
            }),
            Some(0x00) | Some(0xFE) => Ok(Self::Ok(OkPayload::parse(payload)?)),
            Some(0xFF) => Ok(Self::Err(ErrPayload::parse(payload)?)),
            Some(0xFB) => Ok(Self::LocalInfile),
            Some(_) => {
                let mut src = Bytes::copy_from_slice(payload);
                let column_count = read_lenenc_int(&mut src)?;
                Ok(Self::ResultSet { column_count })
            }
        }
    }
}

/// Whether a payload read inside a result set terminates it.
///
/// With `CLIENT_DEPRECATE_EOF` the terminator is an OK payload with header
/// 0xFE; without it, a legacy EOF. Row payloads never start with 0xFE: a
/// text cell that long would use the 8-byte length form only for contents
/// over 16 MiB, which the session splits at the frame layer first.
#[must_use]
pub fn is_resultset_terminator(payload: &[u8]) -> bool {
    payload.first() == Some(&0xFE)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ok() {
        // header, affected=3, last_insert_id=0, status=MORE_RESULTS|AUTOCOMMIT, warnings=0
        let ok = OkPayload::parse(&[0x00, 0x03, 0x00, 0x0A, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(ok.affected_rows, 3);
        assert_eq!(ok.last_insert_id, 0);
        assert!(ok.more_results());
        assert_eq!(ok.warnings, 0);
    }

    #[test]
    fn test_parse_deprecate_eof_ok() {
        let ok = OkPayload::parse(&[0xFE, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(ok.affected_rows, 0);
        assert!(!ok.more_results());
    }

    #[test]
    fn test_parse_legacy_eof() {
        let ok = OkPayload::parse(&[0xFE, 0x01, 0x00, 0x08, 0x00]).unwrap();
        assert_eq!(ok.warnings, 1);
        assert!(ok.more_results());
    }

    #[test]
    fn test_parse_err() {
        let mut payload = vec![0xFF, 0x48, 0x04, b'#'];
        payload.extend_from_slice(b"42S02");
        payload.extend_from_slice(b"Table 'test.missing' doesn't exist");
        let err = ErrPayload::parse(&payload).unwrap();
        assert_eq!(err.code, 0x0448);
        assert_eq!(err.sql_state, "42S02");
        assert!(err.message.contains("missing"));
    }

    #[test]
    fn test_response_dispatch() {
        assert!(matches!(
            QueryResponse::parse(&[0x00, 0x00, 0x00, 0x02, 0x00]).unwrap(),
            QueryResponse::Ok(_)
        ));
        assert!(matches!(
            QueryResponse::parse(&[0x02]).unwrap(),
            QueryResponse::ResultSet { column_count: 2 }
        ));
        assert!(matches!(
            QueryResponse::parse(&[0xFB]).unwrap(),
            QueryResponse::LocalInfile
        ));
    }

    #[test]
    fn test_terminator_detection() {
        assert!(is_resultset_terminator(&[0xFE, 0x00, 0x00, 0x02, 0x00]));
        assert!(!is_resultset_terminator(&[0x01, b'1']));
    }
}
