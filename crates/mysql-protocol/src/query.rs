//! COM_QUERY request encoding.
//!
//! The wire format is minimal: the opcode byte followed by the raw UTF-8
//! statement text, with no length prefix or terminator.

use bytes::Bytes;

use crate::command::CommandKind;
use crate::error::Result;
use crate::writer::PayloadWriter;

/// Write a COM_QUERY body into `writer`.
pub fn write_query(writer: &mut PayloadWriter, sql: &str) -> Result<()> {
    writer.put_u8(CommandKind::Query as u8)?;
    writer.write(sql.as_bytes())
}

/// Encode a standalone COM_QUERY payload.
///
/// # Example
///
/// ```
/// use mysql_protocol::query::encode_query;
///
/// let payload = encode_query("SELECT 1").unwrap();
/// assert_eq!(&payload[..], b"\x03SELECT 1");
/// ```
pub fn encode_query(sql: &str) -> Result<Bytes> {
    let mut writer = PayloadWriter::new();
    write_query(&mut writer, sql)?;
    Ok(writer.into_payload())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_query() {
        let payload = encode_query("SELECT 1").unwrap();
        assert_eq!(payload[0], 0x03);
        assert_eq!(&payload[1..], b"SELECT 1");
    }

    #[test]
    fn test_empty_statement_is_opcode_only() {
        let payload = encode_query("").unwrap();
        assert_eq!(&payload[..], &[0x03]);
    }
}
