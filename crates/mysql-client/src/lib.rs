//! # mysql-client
//!
//! The batch command execution core of the rust-mysql-driver project.
//!
//! A [`Batch`] turns an ordered list of logical SQL commands plus
//! parameters into framed protocol payloads, manages the resulting
//! multi-result streaming read path, and coordinates timeouts and
//! cooperative cancellation against a shared per-session connection.
//!
//! ## Features
//!
//! - **Three payload strategies**: COM_MULTI batching on MariaDB,
//!   per-statement pipelining for prepared batches, and semicolon
//!   concatenation as the fallback
//! - **Server-side prepared statements**: registered on demand through the
//!   session's LRU-backed registry
//! - **Streaming results**: result sets and rows are pulled lazily, in
//!   submission order
//! - **Cooperative cancellation**: an external `CancellationToken` triggers
//!   the connection's cancel sideband through a scoped registration
//!
//! ## Example
//!
//! ```rust,ignore
//! use mysql_client::{Batch, BatchCommand, IoBehavior};
//!
//! let mut batch = Batch::new(&mut session);
//! batch.add(BatchCommand::new("SELECT 1"));
//! batch.add(BatchCommand::new("SELECT 2"));
//!
//! let mut reader = batch.execute_reader(IoBehavior::Asynchronous, None).await?;
//! loop {
//!     while let Some(row) = reader.next_row().await? {
//!         println!("{:?}", row.get(0));
//!     }
//!     if !reader.next_result_set().await? {
//!         break;
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod batch;
pub mod cancel;
pub mod error;
pub mod executor;
pub mod options;
pub mod payload;
pub mod session;
pub mod sql_text;
pub mod statement_cache;
pub mod stream;
pub mod testing;

// Re-export commonly used types
pub use batch::{Batch, BatchCommand, BatchCommandKind, BatchParameter};
pub use cancel::CancellationScope;
pub use error::{Error, Result};
pub use mysql_types::MySqlValue;
pub use options::{CommandBehavior, IoBehavior, DEFAULT_COMMAND_TIMEOUT_SECS};
pub use payload::{CommandCursor, PayloadCreator};
pub use session::{
    CachedProcedure, CancelSideband, ConnectionState, ProcedureCache, ProcedureParameter, Session,
    TransactionId,
};
pub use statement_cache::{
    PreparedStatement, PreparedStatements, StatementCache, DEFAULT_MAX_STATEMENTS,
};
pub use stream::{BatchReader, Row};
