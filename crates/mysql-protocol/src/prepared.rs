//! Prepared-statement request encoding and response parsing.
//!
//! COM_STMT_PREPARE sends the statement text; the server answers with a
//! [`PrepareOk`] carrying the statement id. COM_STMT_EXECUTE then runs the
//! statement with binary-encoded parameters:
//!
//! ```text
//! 0x17 || stmt_id u32le || flags u8 || iteration_count u32le
//!      || null_bitmap || new_params_bound u8 || (type u8, flags u8)* || value*
//! ```
//!
//! The parameter section is present only when the statement has parameters.
//! Types are re-sent on every execution (`new_params_bound = 1`), which
//! keeps executions independent of the server's remembered bindings.

use bytes::Bytes;
use mysql_types::MySqlValue;

use crate::codec::{read_u8, read_u16_le, read_u32_le, write_lenenc_bytes};
use crate::column::ColumnType;
use crate::command::CommandKind;
use crate::error::{ProtocolError, Result};
use crate::writer::PayloadWriter;

/// Flag bit marking a parameter type as unsigned.
pub const UNSIGNED_TYPE_FLAG: u8 = 0x80;

/// Write a COM_STMT_PREPARE body into `writer`.
pub fn write_prepare(writer: &mut PayloadWriter, sql: &str) -> Result<()> {
    writer.put_u8(CommandKind::StatementPrepare as u8)?;
    writer.write(sql.as_bytes())
}

/// Response to COM_STMT_PREPARE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareOk {
    /// Server-assigned statement id.
    pub statement_id: u32,
    /// Number of result columns the statement produces.
    pub column_count: u16,
    /// Number of parameter placeholders in the statement.
    pub parameter_count: u16,
    /// Warning count.
    pub warnings: u16,
}

impl PrepareOk {
    /// Parse a COM_STMT_PREPARE OK payload.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut src = Bytes::copy_from_slice(payload);
        if read_u8(&mut src)? != 0x00 {
            return Err(ProtocolError::Malformed("prepare OK"));
        }
        let statement_id = read_u32_le(&mut src)?;
        let column_count = read_u16_le(&mut src)?;
        let parameter_count = read_u16_le(&mut src)?;
        let _reserved = read_u8(&mut src)?;
        let warnings = read_u16_le(&mut src)?;
        Ok(Self {
            statement_id,
            column_count,
            parameter_count,
            warnings,
        })
    }

    /// Encode a prepare OK payload (used by test sessions).
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![0x00];
        out.extend_from_slice(&self.statement_id.to_le_bytes());
        out.extend_from_slice(&self.column_count.to_le_bytes());
        out.extend_from_slice(&self.parameter_count.to_le_bytes());
        out.push(0x00);
        out.extend_from_slice(&self.warnings.to_le_bytes());
        out
    }
}

fn parameter_type(value: &MySqlValue) -> (ColumnType, u8) {
    match value {
        MySqlValue::Null => (ColumnType::Null, 0),
        MySqlValue::Int(_) => (ColumnType::LongLong, 0),
        MySqlValue::UInt(_) => (ColumnType::LongLong, UNSIGNED_TYPE_FLAG),
        MySqlValue::Float(_) => (ColumnType::Float, 0),
        MySqlValue::Double(_) => (ColumnType::Double, 0),
        MySqlValue::Text(_) => (ColumnType::VarString, 0),
        MySqlValue::Bytes(_) => (ColumnType::Blob, 0),
    }
}

/// Write a COM_STMT_EXECUTE body into `writer`.
pub fn write_execute(
    writer: &mut PayloadWriter,
    statement_id: u32,
    params: &[MySqlValue],
) -> Result<()> {
    writer.put_u8(CommandKind::StatementExecute as u8)?;
    writer.put_u32_le(statement_id)?;
    // flags: CURSOR_TYPE_NO_CURSOR
    writer.put_u8(0x00)?;
    // iteration count is always 1
    writer.put_u32_le(1)?;

    if params.is_empty() {
        return Ok(());
    }

    let mut bitmap = vec![0u8; (params.len() + 7) / 8];
    for (i, value) in params.iter().enumerate() {
        if value.is_null() {
            bitmap[i / 8] |= 1 << (i % 8);
        }
    }
    writer.write(&bitmap)?;

    // new-params-bound flag, then one (type, flags) pair per parameter
    writer.put_u8(0x01)?;
    for value in params {
        let (column_type, flags) = parameter_type(value);
        writer.put_u8(column_type as u8)?;
        writer.put_u8(flags)?;
    }

    for value in params {
        match value {
            MySqlValue::Null => {}
            MySqlValue::Int(v) => writer.put_u64_le(*v as u64)?,
            MySqlValue::UInt(v) => writer.put_u64_le(*v)?,
            MySqlValue::Float(v) => writer.put_u32_le(v.to_bits())?,
            MySqlValue::Double(v) => writer.put_u64_le(v.to_bits())?,
            MySqlValue::Text(v) => {
                let mut encoded = Vec::with_capacity(v.len() + 9);
                write_lenenc_bytes(&mut encoded, v.as_bytes());
                writer.write(&encoded)?;
            }
            MySqlValue::Bytes(v) => {
                let mut encoded = Vec::with_capacity(v.len() + 9);
                write_lenenc_bytes(&mut encoded, v);
                writer.write(&encoded)?;
            }
        }
    }
    Ok(())
}

/// Write a COM_STMT_CLOSE body into `writer`.
///
/// Sessions send this when a prepared statement is evicted from the
/// registry; the server does not respond.
pub fn write_statement_close(writer: &mut PayloadWriter, statement_id: u32) -> Result<()> {
    writer.put_u8(CommandKind::StatementClose as u8)?;
    writer.put_u32_le(statement_id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_encoding() {
        let mut writer = PayloadWriter::new();
        write_prepare(&mut writer, "SELECT ?").unwrap();
        assert_eq!(writer.as_slice(), b"\x16SELECT ?");
    }

    #[test]
    fn test_prepare_ok_roundtrip() {
        let ok = PrepareOk {
            statement_id: 7,
            column_count: 2,
            parameter_count: 1,
            warnings: 0,
        };
        assert_eq!(PrepareOk::parse(&ok.encode()).unwrap(), ok);
    }

    #[test]
    fn test_execute_without_parameters() {
        let mut writer = PayloadWriter::new();
        write_execute(&mut writer, 3, &[]).unwrap();
        assert_eq!(
            writer.as_slice(),
            &[0x17, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_execute_with_parameters() {
        let mut writer = PayloadWriter::new();
        write_execute(
            &mut writer,
            1,
            &[
                MySqlValue::Null,
                MySqlValue::Int(5),
                MySqlValue::Text("hi".into()),
            ],
        )
        .unwrap();

        let body = writer.as_slice();
        // Fixed header: opcode, id, flags, iteration count.
        assert_eq!(&body[..10], &[0x17, 1, 0, 0, 0, 0x00, 1, 0, 0, 0]);
        // NULL bitmap: only parameter 0 is null.
        assert_eq!(body[10], 0b0000_0001);
        // new-params-bound, then (type, flags) per parameter.
        assert_eq!(body[11], 0x01);
        assert_eq!(&body[12..18], &[0x06, 0, 0x08, 0, 0xFD, 0]);
        // Values: the i64, then the length-encoded string; no bytes for NULL.
        assert_eq!(&body[18..26], &5u64.to_le_bytes());
        assert_eq!(&body[26..], &[0x02, b'h', b'i']);
    }

    #[test]
    fn test_unsigned_parameter_flag() {
        let mut writer = PayloadWriter::new();
        write_execute(&mut writer, 1, &[MySqlValue::UInt(9)]).unwrap();
        let body = writer.as_slice();
        assert_eq!(&body[12..14], &[0x08, UNSIGNED_TYPE_FLAG]);
    }

    #[test]
    fn test_statement_close() {
        let mut writer = PayloadWriter::new();
        write_statement_close(&mut writer, 0x0102).unwrap();
        assert_eq!(writer.as_slice(), &[0x19, 0x02, 0x01, 0x00, 0x00]);
    }
}
