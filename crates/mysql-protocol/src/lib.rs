//! # mysql-protocol
//!
//! Pure implementation of the MySQL/MariaDB client-server wire protocol as
//! consumed by the batch execution core: command payload encoding, response
//! payload parsing, and the growable payload writer with deferred length
//! patching used to frame COM_MULTI sub-commands.
//!
//! ## Design Philosophy
//!
//! This crate is intentionally IO-agnostic. It contains no networking logic
//! and makes no assumptions about the async runtime; the session layer owns
//! framing (the 4-byte packet header) and transport. Everything here
//! operates on complete packet payloads.
//!
//! ## Example
//!
//! ```
//! use mysql_protocol::writer::PayloadWriter;
//! use mysql_protocol::query::write_query;
//!
//! let mut writer = PayloadWriter::new();
//! write_query(&mut writer, "SELECT 1").unwrap();
//! assert_eq!(writer.as_slice(), b"\x03SELECT 1");
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod codec;
pub mod column;
pub mod command;
pub mod error;
pub mod multi;
pub mod packet;
pub mod prepared;
pub mod query;
pub mod row;
pub mod writer;

pub use column::{ColumnDefinition, ColumnFlags, ColumnType, BINARY_CHARSET};
pub use command::{CommandKind, ServerStatus};
pub use error::ProtocolError;
pub use multi::{SUBCOMMAND_HEADER_LEN, SUBCOMMAND_MARKER};
pub use packet::{is_resultset_terminator, ErrPayload, OkPayload, QueryResponse};
pub use prepared::PrepareOk;
pub use writer::{PayloadWriter, DEFAULT_PAYLOAD_LIMIT};
