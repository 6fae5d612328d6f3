//! Column metadata parsing.

use bitflags::bitflags;
use bytes::{Buf, Bytes};

use crate::codec::{read_lenenc_bytes, read_lenenc_int, read_lenenc_str, read_u8, read_u16_le, read_u32_le};
use crate::error::{ProtocolError, Result};

/// Binary collation id; string columns with this charset hold raw bytes.
pub const BINARY_CHARSET: u16 = 63;

/// MySQL column type bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColumnType {
    /// DECIMAL (legacy).
    Decimal = 0x00,
    /// TINYINT.
    Tiny = 0x01,
    /// SMALLINT.
    Short = 0x02,
    /// INT.
    Long = 0x03,
    /// FLOAT.
    Float = 0x04,
    /// DOUBLE.
    Double = 0x05,
    /// NULL-typed parameter.
    Null = 0x06,
    /// TIMESTAMP.
    Timestamp = 0x07,
    /// BIGINT.
    LongLong = 0x08,
    /// MEDIUMINT.
    Int24 = 0x09,
    /// DATE.
    Date = 0x0A,
    /// TIME.
    Time = 0x0B,
    /// DATETIME.
    DateTime = 0x0C,
    /// YEAR.
    Year = 0x0D,
    /// VARCHAR.
    Varchar = 0x0F,
    /// BIT.
    Bit = 0x10,
    /// JSON.
    Json = 0xF5,
    /// DECIMAL.
    NewDecimal = 0xF6,
    /// ENUM.
    Enum = 0xF7,
    /// SET.
    Set = 0xF8,
    /// TINYBLOB/TINYTEXT.
    TinyBlob = 0xF9,
    /// MEDIUMBLOB/MEDIUMTEXT.
    MediumBlob = 0xFA,
    /// LONGBLOB/LONGTEXT.
    LongBlob = 0xFB,
    /// BLOB/TEXT.
    Blob = 0xFC,
    /// VARBINARY/VARCHAR.
    VarString = 0xFD,
    /// CHAR/BINARY.
    String = 0xFE,
    /// GEOMETRY.
    Geometry = 0xFF,
}

impl ColumnType {
    /// Create a column type from its wire byte.
    pub fn from_u8(value: u8) -> Result<Self> {
        Ok(match value {
            0x00 => Self::Decimal,
            0x01 => Self::Tiny,
            0x02 => Self::Short,
            0x03 => Self::Long,
            0x04 => Self::Float,
            0x05 => Self::Double,
            0x06 => Self::Null,
            0x07 => Self::Timestamp,
            0x08 => Self::LongLong,
            0x09 => Self::Int24,
            0x0A => Self::Date,
            0x0B => Self::Time,
            0x0C => Self::DateTime,
            0x0D => Self::Year,
            0x0F => Self::Varchar,
            0x10 => Self::Bit,
            0xF5 => Self::Json,
            0xF6 => Self::NewDecimal,
            0xF7 => Self::Enum,
            0xF8 => Self::Set,
            0xF9 => Self::TinyBlob,
            0xFA => Self::MediumBlob,
            0xFB => Self::LongBlob,
            0xFC => Self::Blob,
            0xFD => Self::VarString,
            0xFE => Self::String,
            0xFF => Self::Geometry,
            other => return Err(ProtocolError::UnknownColumnType(other)),
        })
    }
}

bitflags! {
    /// Column definition flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ColumnFlags: u16 {
        /// Column may not be NULL.
        const NOT_NULL = 0x0001;
        /// Column is part of a primary key.
        const PRIMARY_KEY = 0x0002;
        /// Column holds an unsigned integer.
        const UNSIGNED = 0x0020;
        /// Column holds binary data.
        const BINARY = 0x0080;
        /// Column auto-increments.
        const AUTO_INCREMENT = 0x0200;
    }
}

/// A protocol::41 column definition.
#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    /// Schema the column belongs to.
    pub schema: String,
    /// Table (possibly aliased) the column belongs to.
    pub table: String,
    /// Column name (possibly aliased).
    pub name: String,
    /// Character set id; [`BINARY_CHARSET`] for raw bytes.
    pub charset: u16,
    /// Maximum display length.
    pub column_length: u32,
    /// Wire type of the column.
    pub column_type: ColumnType,
    /// Definition flags.
    pub flags: ColumnFlags,
    /// Decimal digits for numeric types.
    pub decimals: u8,
}

impl ColumnDefinition {
    /// Parse a column definition payload.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut src = Bytes::copy_from_slice(payload);

        // catalog is always "def"; skip it along with the original names.
        let _catalog = read_lenenc_bytes(&mut src)?;
        let schema = read_lenenc_str(&mut src, "schema")?;
        let table = read_lenenc_str(&mut src, "table")?;
        let _org_table = read_lenenc_bytes(&mut src)?;
        let name = read_lenenc_str(&mut src, "column name")?;
        let _org_name = read_lenenc_bytes(&mut src)?;

        let fixed_len = read_lenenc_int(&mut src)?;
        if fixed_len != 0x0C {
            return Err(ProtocolError::Malformed("column definition"));
        }
        let charset = read_u16_le(&mut src)?;
        let column_length = read_u32_le(&mut src)?;
        let column_type = ColumnType::from_u8(read_u8(&mut src)?)?;
        let flags = ColumnFlags::from_bits_truncate(read_u16_le(&mut src)?);
        let decimals = read_u8(&mut src)?;
        // Two filler bytes close the fixed section.
        if src.remaining() >= 2 {
            src.advance(2);
        }

        Ok(Self {
            schema,
            table,
            name,
            charset,
            column_length,
            column_type,
            flags,
            decimals,
        })
    }

    /// Whether the column holds an unsigned integer.
    #[must_use]
    pub fn is_unsigned(&self) -> bool {
        self.flags.contains(ColumnFlags::UNSIGNED)
    }
}

/// Encode a column definition payload (used by test sessions).
#[must_use]
pub fn encode_column_definition(def: &ColumnDefinition) -> Vec<u8> {
    use crate::codec::write_lenenc_bytes;
    let mut out = Vec::new();
    write_lenenc_bytes(&mut out, b"def");
    write_lenenc_bytes(&mut out, def.schema.as_bytes());
    write_lenenc_bytes(&mut out, def.table.as_bytes());
    write_lenenc_bytes(&mut out, def.table.as_bytes());
    write_lenenc_bytes(&mut out, def.name.as_bytes());
    write_lenenc_bytes(&mut out, def.name.as_bytes());
    out.push(0x0C);
    out.extend_from_slice(&def.charset.to_le_bytes());
    out.extend_from_slice(&def.column_length.to_le_bytes());
    out.push(def.column_type as u8);
    out.extend_from_slice(&def.flags.bits().to_le_bytes());
    out.push(def.decimals);
    out.extend_from_slice(&[0, 0]);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> ColumnDefinition {
        ColumnDefinition {
            schema: "test".into(),
            table: "t".into(),
            name: "id".into(),
            charset: 33,
            column_length: 11,
            column_type: ColumnType::Long,
            flags: ColumnFlags::NOT_NULL | ColumnFlags::UNSIGNED,
            decimals: 0,
        }
    }

    #[test]
    fn test_column_definition_roundtrip() {
        let encoded = encode_column_definition(&sample());
        let parsed = ColumnDefinition::parse(&encoded).unwrap();
        assert_eq!(parsed.name, "id");
        assert_eq!(parsed.schema, "test");
        assert_eq!(parsed.column_type, ColumnType::Long);
        assert!(parsed.is_unsigned());
        assert_eq!(parsed.column_length, 11);
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(matches!(
            ColumnType::from_u8(0x44),
            Err(ProtocolError::UnknownColumnType(0x44))
        ));
    }
}
