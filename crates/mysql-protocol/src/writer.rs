//! Growable payload writer with deferred length patching.
//!
//! Command payload creators frame sub-commands whose lengths are unknown
//! until after the body has been written. [`PayloadWriter`] supports this by
//! exposing stable absolute positions and in-place overwrite of previously
//! written bytes: callers reserve a fixed-width placeholder, record its
//! position, write the body, then patch the placeholder via
//! [`PayloadWriter::slice_from`].
//!
//! Positions remain valid across buffer growth; only [`PayloadWriter::trim_end`]
//! invalidates positions past the new end.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{ProtocolError, Result};

/// Default hard limit for a single command payload (1 GiB, the ceiling of
/// `max_allowed_packet`).
pub const DEFAULT_PAYLOAD_LIMIT: usize = 1 << 30;

/// A growable byte buffer for building command payloads.
#[derive(Debug)]
pub struct PayloadWriter {
    buf: BytesMut,
    limit: usize,
}

impl PayloadWriter {
    /// Create a writer with the default payload limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_PAYLOAD_LIMIT)
    }

    /// Create a writer that fails with [`ProtocolError::BufferOverflow`]
    /// once more than `limit` bytes have been written.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            limit,
        }
    }

    fn ensure(&mut self, additional: usize) -> Result<()> {
        if self.buf.len() + additional > self.limit {
            return Err(ProtocolError::BufferOverflow { limit: self.limit });
        }
        Ok(())
    }

    /// Append raw bytes.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure(bytes.len())?;
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Append a single byte.
    pub fn put_u8(&mut self, value: u8) -> Result<()> {
        self.ensure(1)?;
        self.buf.put_u8(value);
        Ok(())
    }

    /// Append a little-endian u16.
    pub fn put_u16_le(&mut self, value: u16) -> Result<()> {
        self.ensure(2)?;
        self.buf.put_u16_le(value);
        Ok(())
    }

    /// Append a little-endian u32.
    pub fn put_u32_le(&mut self, value: u32) -> Result<()> {
        self.ensure(4)?;
        self.buf.put_u32_le(value);
        Ok(())
    }

    /// Append a little-endian u64.
    pub fn put_u64_le(&mut self, value: u64) -> Result<()> {
        self.ensure(8)?;
        self.buf.put_u64_le(value);
        Ok(())
    }

    /// Current write position (also the number of bytes written).
    #[must_use]
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Mutable view of everything from `position` to the current end.
    ///
    /// Used to patch a previously reserved placeholder in place.
    ///
    /// # Panics
    ///
    /// Panics if `position` is past the current end.
    pub fn slice_from(&mut self, position: usize) -> &mut [u8] {
        &mut self.buf[position..]
    }

    /// Discard the last `n` bytes.
    pub fn trim_end(&mut self, n: usize) {
        let len = self.buf.len().saturating_sub(n);
        self.buf.truncate(len);
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// View the written payload.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Freeze the writer into an immutable payload.
    #[must_use]
    pub fn into_payload(self) -> Bytes {
        self.buf.freeze()
    }
}

impl Default for PayloadWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_position() {
        let mut writer = PayloadWriter::new();
        assert!(writer.is_empty());
        writer.write(b"abc").unwrap();
        assert_eq!(writer.position(), 3);
        writer.put_u16_le(0x0201).unwrap();
        assert_eq!(writer.as_slice(), &[b'a', b'b', b'c', 0x01, 0x02]);
    }

    #[test]
    fn test_deferred_length_patch() {
        let mut writer = PayloadWriter::new();
        writer.put_u8(0x10).unwrap();
        let reserved = writer.position();
        writer.write(&[0u8; 4]).unwrap();
        writer.write(b"body").unwrap();

        let length = writer.position() - reserved - 4;
        let span = writer.slice_from(reserved);
        span[..4].copy_from_slice(&(length as u32).to_le_bytes());

        assert_eq!(
            writer.as_slice(),
            &[0x10, 0x04, 0x00, 0x00, 0x00, b'b', b'o', b'd', b'y']
        );
    }

    #[test]
    fn test_positions_stable_across_growth() {
        let mut writer = PayloadWriter::new();
        let reserved = writer.position();
        writer.write(&[0u8; 9]).unwrap();
        // Force several reallocations.
        for _ in 0..64 {
            writer.write(&[0xAA; 1024]).unwrap();
        }
        let span = writer.slice_from(reserved);
        span[0] = 0xFE;
        assert_eq!(writer.as_slice()[0], 0xFE);
    }

    #[test]
    fn test_trim_end() {
        let mut writer = PayloadWriter::new();
        writer.write(b"123456789").unwrap();
        writer.trim_end(9);
        assert!(writer.is_empty());
        writer.trim_end(1);
        assert!(writer.is_empty());
    }

    #[test]
    fn test_overflow() {
        let mut writer = PayloadWriter::with_limit(4);
        writer.write(b"1234").unwrap();
        assert!(matches!(
            writer.put_u8(0),
            Err(ProtocolError::BufferOverflow { limit: 4 })
        ));
        // The buffer is unchanged after a rejected write.
        assert_eq!(writer.as_slice(), b"1234");
    }
}
