//! Row payload decoding for the text and binary protocols.
//!
//! Text rows (COM_QUERY responses) carry every cell as a length-encoded
//! string with 0xFB marking NULL. Binary rows (COM_STMT_EXECUTE responses)
//! start with a 0x00 header, then a NULL bitmap offset by two bits, then
//! type-directed cell encodings. Numeric cells are decoded into their
//! native representations; temporal cells are surfaced as raw bytes.

use bytes::{Buf, Bytes};
use mysql_types::MySqlValue;

use crate::codec::{read_lenenc_bytes, read_u8, NULL_MARKER};
use crate::column::{ColumnDefinition, ColumnType, BINARY_CHARSET};
use crate::error::{ProtocolError, Result};

fn need(src: &Bytes, expected: usize) -> Result<()> {
    if src.remaining() < expected {
        return Err(ProtocolError::Truncated {
            expected,
            actual: src.remaining(),
        });
    }
    Ok(())
}

fn text_cell(raw: Bytes, def: &ColumnDefinition) -> Result<MySqlValue> {
    let as_str = || {
        std::str::from_utf8(&raw).map_err(|_| ProtocolError::InvalidUtf8("text row cell"))
    };
    Ok(match def.column_type {
        ColumnType::Tiny
        | ColumnType::Short
        | ColumnType::Long
        | ColumnType::Int24
        | ColumnType::LongLong
        | ColumnType::Year => {
            let text = as_str()?;
            if def.is_unsigned() {
                MySqlValue::UInt(
                    text.parse()
                        .map_err(|_| ProtocolError::Malformed("integer cell"))?,
                )
            } else {
                MySqlValue::Int(
                    text.parse()
                        .map_err(|_| ProtocolError::Malformed("integer cell"))?,
                )
            }
        }
        ColumnType::Float => MySqlValue::Float(
            as_str()?
                .parse()
                .map_err(|_| ProtocolError::Malformed("float cell"))?,
        ),
        ColumnType::Double => MySqlValue::Double(
            as_str()?
                .parse()
                .map_err(|_| ProtocolError::Malformed("double cell"))?,
        ),
        ColumnType::TinyBlob
        | ColumnType::MediumBlob
        | ColumnType::LongBlob
        | ColumnType::Blob
        | ColumnType::VarString
        | ColumnType::String
        | ColumnType::Geometry
            if def.charset == BINARY_CHARSET =>
        {
            MySqlValue::Bytes(raw)
        }
        _ => MySqlValue::Text(as_str()?.to_string()),
    })
}

/// Decode a text-protocol row into one value per column.
pub fn decode_text_row(payload: &[u8], columns: &[ColumnDefinition]) -> Result<Vec<MySqlValue>> {
    let mut src = Bytes::copy_from_slice(payload);
    let mut cells = Vec::with_capacity(columns.len());
    for def in columns {
        if src.first() == Some(&NULL_MARKER) {
            src.advance(1);
            cells.push(MySqlValue::Null);
            continue;
        }
        cells.push(text_cell(read_lenenc_bytes(&mut src)?, def)?);
    }
    Ok(cells)
}

fn binary_cell(src: &mut Bytes, def: &ColumnDefinition) -> Result<MySqlValue> {
    let unsigned = def.is_unsigned();
    Ok(match def.column_type {
        ColumnType::Tiny => {
            need(src, 1)?;
            let v = src.get_u8();
            if unsigned {
                MySqlValue::UInt(u64::from(v))
            } else {
                MySqlValue::Int(i64::from(v as i8))
            }
        }
        ColumnType::Short | ColumnType::Year => {
            need(src, 2)?;
            let v = src.get_u16_le();
            if unsigned {
                MySqlValue::UInt(u64::from(v))
            } else {
                MySqlValue::Int(i64::from(v as i16))
            }
        }
        ColumnType::Long | ColumnType::Int24 => {
            need(src, 4)?;
            let v = src.get_u32_le();
            if unsigned {
                MySqlValue::UInt(u64::from(v))
            } else {
                MySqlValue::Int(i64::from(v as i32))
            }
        }
        ColumnType::LongLong => {
            need(src, 8)?;
            let v = src.get_u64_le();
            if unsigned {
                MySqlValue::UInt(v)
            } else {
                MySqlValue::Int(v as i64)
            }
        }
        ColumnType::Float => {
            need(src, 4)?;
            MySqlValue::Float(src.get_f32_le())
        }
        ColumnType::Double => {
            need(src, 8)?;
            MySqlValue::Double(src.get_f64_le())
        }
        ColumnType::Date
        | ColumnType::Time
        | ColumnType::DateTime
        | ColumnType::Timestamp => {
            // Length-prefixed temporal structure, surfaced undecoded.
            let len = usize::from(read_u8(src)?);
            need(src, len)?;
            MySqlValue::Bytes(src.split_to(len))
        }
        ColumnType::Null => MySqlValue::Null,
        _ => {
            let raw = read_lenenc_bytes(src)?;
            if def.charset == BINARY_CHARSET {
                MySqlValue::Bytes(raw)
            } else {
                MySqlValue::Text(
                    String::from_utf8(raw.to_vec())
                        .map_err(|_| ProtocolError::InvalidUtf8("binary row cell"))?,
                )
            }
        }
    })
}

/// Decode a binary-protocol row into one value per column.
pub fn decode_binary_row(payload: &[u8], columns: &[ColumnDefinition]) -> Result<Vec<MySqlValue>> {
    let mut src = Bytes::copy_from_slice(payload);
    if read_u8(&mut src)? != 0x00 {
        return Err(ProtocolError::Malformed("binary row"));
    }

    // NULL bitmap with a two-bit offset.
    let bitmap_len = (columns.len() + 7 + 2) / 8;
    need(&src, bitmap_len)?;
    let bitmap = src.split_to(bitmap_len);

    let mut cells = Vec::with_capacity(columns.len());
    for (i, def) in columns.iter().enumerate() {
        let bit = i + 2;
        if bitmap[bit / 8] & (1 << (bit % 8)) != 0 {
            cells.push(MySqlValue::Null);
        } else {
            cells.push(binary_cell(&mut src, def)?);
        }
    }
    Ok(cells)
}
