//! COM_MULTI sub-command framing.
//!
//! A COM_MULTI payload wraps several ordinary command bodies in one round
//! trip. Each sub-command is prefixed by a 9-byte header: the marker byte
//! 0xFE followed by the inner payload length as a little-endian u64. The
//! length excludes the header itself.
//!
//! Because the inner length is unknown until the body has been written,
//! framing is a three-step dance: reserve the header with
//! [`begin_subcommand`], write the body, then patch the header with
//! [`finish_subcommand`].

use crate::error::Result;
use crate::writer::PayloadWriter;

/// Width of a sub-command header: marker byte plus u64 length.
pub const SUBCOMMAND_HEADER_LEN: usize = 9;

/// Marker byte that opens every sub-command header.
pub const SUBCOMMAND_MARKER: u8 = 0xFE;

/// Reserve a sub-command header, returning its position for later patching.
pub fn begin_subcommand(writer: &mut PayloadWriter) -> Result<usize> {
    let position = writer.position();
    writer.write(&[0u8; SUBCOMMAND_HEADER_LEN])?;
    Ok(position)
}

/// Patch the header reserved at `position` with the length of the bytes
/// written since.
pub fn finish_subcommand(writer: &mut PayloadWriter, position: usize) {
    let length = (writer.position() - position - SUBCOMMAND_HEADER_LEN) as u64;
    let span = writer.slice_from(position);
    span[0] = SUBCOMMAND_MARKER;
    span[1..SUBCOMMAND_HEADER_LEN].copy_from_slice(&length.to_le_bytes());
}
