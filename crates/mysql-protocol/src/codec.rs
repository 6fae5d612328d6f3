//! Length-encoded primitives used throughout the MySQL wire protocol.
//!
//! Decoders operate on [`Bytes`] so variable-length fields can be sliced
//! out without copying; encoders write through any [`BufMut`].

use bytes::{Buf, BufMut, Bytes};

use crate::error::{ProtocolError, Result};

/// Marker byte for a NULL cell in a text-protocol row.
pub const NULL_MARKER: u8 = 0xFB;

fn need(src: &Bytes, expected: usize) -> Result<()> {
    if src.remaining() < expected {
        return Err(ProtocolError::Truncated {
            expected,
            actual: src.remaining(),
        });
    }
    Ok(())
}

/// Read a length-encoded integer.
///
/// The first byte selects the width: values below 0xFB are literal,
/// 0xFC/0xFD/0xFE introduce 2/3/8-byte little-endian integers. 0xFB is
/// the NULL marker and is rejected here; callers that expect NULL cells
/// must check for it before decoding.
pub fn read_lenenc_int(src: &mut Bytes) -> Result<u64> {
    need(src, 1)?;
    match src.get_u8() {
        v @ 0x00..=0xFA => Ok(u64::from(v)),
        0xFC => {
            need(src, 2)?;
            Ok(u64::from(src.get_u16_le()))
        }
        0xFD => {
            need(src, 3)?;
            let mut v = u64::from(src.get_u16_le());
            v |= u64::from(src.get_u8()) << 16;
            Ok(v)
        }
        0xFE => {
            need(src, 8)?;
            Ok(src.get_u64_le())
        }
        _ => Err(ProtocolError::Malformed("length-encoded integer")),
    }
}

/// Write a length-encoded integer in its shortest form.
pub fn write_lenenc_int(dst: &mut impl BufMut, value: u64) {
    match value {
        0..=0xFA => dst.put_u8(value as u8),
        0xFB..=0xFFFF => {
            dst.put_u8(0xFC);
            dst.put_u16_le(value as u16);
        }
        0x1_0000..=0xFF_FFFF => {
            dst.put_u8(0xFD);
            dst.put_u16_le((value & 0xFFFF) as u16);
            dst.put_u8((value >> 16) as u8);
        }
        _ => {
            dst.put_u8(0xFE);
            dst.put_u64_le(value);
        }
    }
}

/// Read a length-encoded byte string, sliced out of `src` without copying.
pub fn read_lenenc_bytes(src: &mut Bytes) -> Result<Bytes> {
    let len = usize::try_from(read_lenenc_int(src)?)
        .map_err(|_| ProtocolError::Malformed("length-encoded string"))?;
    need(src, len)?;
    Ok(src.split_to(len))
}

/// Read a length-encoded UTF-8 string.
pub fn read_lenenc_str(src: &mut Bytes, context: &'static str) -> Result<String> {
    let bytes = read_lenenc_bytes(src)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| ProtocolError::InvalidUtf8(context))
}

/// Write a length-encoded byte string.
pub fn write_lenenc_bytes(dst: &mut impl BufMut, bytes: &[u8]) {
    write_lenenc_int(dst, bytes.len() as u64);
    dst.put_slice(bytes);
}

/// Read a fixed-width little-endian u16.
pub fn read_u16_le(src: &mut Bytes) -> Result<u16> {
    need(src, 2)?;
    Ok(src.get_u16_le())
}

/// Read a fixed-width little-endian u32.
pub fn read_u32_le(src: &mut Bytes) -> Result<u32> {
    need(src, 4)?;
    Ok(src.get_u32_le())
}

/// Read a single byte.
pub fn read_u8(src: &mut Bytes) -> Result<u8> {
    need(src, 1)?;
    Ok(src.get_u8())
}
