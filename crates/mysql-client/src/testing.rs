//! Test support: a scripted in-memory session.
//!
//! [`ScriptedSession`] implements [`Session`] over a queue of canned
//! response payloads and a capture of every transmitted payload, so batch
//! execution can be exercised without a server. Preparation is simulated:
//! command texts are split on `;` into statements and `?` occurrences are
//! counted naively as parameter placeholders, but each statement's
//! acknowledgement still round-trips through an encoded [`PrepareOk`]
//! payload the way a real session parses the server's response.

use std::collections::VecDeque;

use bytes::Bytes;
use mysql_protocol::codec::write_lenenc_int;
use mysql_protocol::column::{encode_column_definition, ColumnDefinition, ColumnFlags, ColumnType};
use mysql_protocol::prepared::{write_prepare, PrepareOk};
use mysql_protocol::{PayloadWriter, ServerStatus};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::options::IoBehavior;
use crate::session::{
    CachedProcedure, CancelSideband, ConnectionState, ProcedureCache, Session, TransactionId,
};
use crate::statement_cache::{PreparedStatement, PreparedStatements, StatementCache};

/// Sideband handle that records cancelled batch ids.
#[derive(Clone, Default)]
pub struct RecordingSideband {
    cancelled: Arc<Mutex<Vec<u64>>>,
}

impl RecordingSideband {
    /// Batch ids cancelled so far.
    #[must_use]
    pub fn cancelled(&self) -> Vec<u64> {
        self.cancelled.lock().clone()
    }
}

impl CancelSideband for RecordingSideband {
    fn cancel(&self, batch_id: u64) {
        self.cancelled.lock().push(batch_id);
    }
}

/// A scripted session for driving batch execution in tests.
pub struct ScriptedSession {
    state: ConnectionState,
    supports_com_multi: bool,
    ignore_prepare: bool,
    ignore_command_transaction: bool,
    transaction: Option<TransactionId>,
    active_reader: bool,
    procedures: ProcedureCache,
    responses: VecDeque<Bytes>,
    transmitted: Vec<Bytes>,
    registry: Mutex<StatementCache>,
    next_statement_id: u32,
    sideband: RecordingSideband,
}

impl ScriptedSession {
    /// Create an open session with COM_MULTI disabled and no script.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Open,
            supports_com_multi: false,
            ignore_prepare: false,
            ignore_command_transaction: false,
            transaction: None,
            active_reader: false,
            procedures: ProcedureCache::new(),
            responses: VecDeque::new(),
            transmitted: Vec::new(),
            registry: Mutex::new(StatementCache::with_default_size()),
            next_statement_id: 1,
            sideband: RecordingSideband::default(),
        }
    }

    /// Set COM_MULTI support.
    #[must_use]
    pub fn with_com_multi(mut self, supported: bool) -> Self {
        self.supports_com_multi = supported;
        self
    }

    /// Set the `IgnorePrepare` connection flag.
    #[must_use]
    pub fn with_ignore_prepare(mut self, ignore: bool) -> Self {
        self.ignore_prepare = ignore;
        self
    }

    /// Set the `IgnoreCommandTransaction` connection flag.
    #[must_use]
    pub fn with_ignore_command_transaction(mut self, ignore: bool) -> Self {
        self.ignore_command_transaction = ignore;
        self
    }

    /// Set the reported connection state.
    #[must_use]
    pub fn with_state(mut self, state: ConnectionState) -> Self {
        self.state = state;
        self
    }

    /// Set the connection's active transaction.
    #[must_use]
    pub fn with_transaction(mut self, transaction: Option<TransactionId>) -> Self {
        self.transaction = transaction;
        self
    }

    /// Mark a reader as already open on the connection.
    #[must_use]
    pub fn with_active_reader(mut self, active: bool) -> Self {
        self.active_reader = active;
        self
    }

    /// Seed the cached-procedure map (a `None` value is a tombstone).
    #[must_use]
    pub fn with_procedure(mut self, name: &str, procedure: Option<CachedProcedure>) -> Self {
        self.procedures.insert(name.to_string(), procedure);
        self
    }

    /// Queue a raw response payload.
    pub fn push_response(&mut self, payload: Vec<u8>) {
        self.responses.push_back(Bytes::from(payload));
    }

    /// Queue an OK payload.
    pub fn push_ok(&mut self, affected: u64, more: bool) {
        self.push_response(ok_payload(affected, more));
    }

    /// Queue a complete text-protocol result set.
    pub fn push_text_result_set(&mut self, columns: &[&str], rows: &[&[&str]], more: bool) {
        let mut header = Vec::new();
        write_lenenc_int(&mut header, columns.len() as u64);
        self.push_response(header);
        for name in columns {
            self.push_response(column_definition_payload(name));
        }
        for row in rows {
            self.push_response(text_row_payload(row));
        }
        self.push_response(eof_payload(more));
    }

    /// Every payload transmitted so far, in order.
    #[must_use]
    pub fn transmitted(&self) -> &[Bytes] {
        &self.transmitted
    }

    /// Number of COM_STMT_PREPARE payloads transmitted so far.
    #[must_use]
    pub fn prepare_count(&self) -> usize {
        self.transmitted
            .iter()
            .filter(|p| p.first() == Some(&0x16))
            .count()
    }

    /// Number of scripted responses not yet consumed.
    #[must_use]
    pub fn remaining_responses(&self) -> usize {
        self.responses.len()
    }

    /// Batch ids delivered to the cancel sideband.
    #[must_use]
    pub fn cancelled_batches(&self) -> Vec<u64> {
        self.sideband.cancelled()
    }

    fn check_cancel(cancel: Option<&CancellationToken>) -> Result<()> {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }
        }
        Ok(())
    }
}

impl Default for ScriptedSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for ScriptedSession {
    type Sideband = RecordingSideband;

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn supports_com_multi(&self) -> bool {
        self.supports_com_multi
    }

    fn ignore_prepare(&self) -> bool {
        self.ignore_prepare
    }

    fn ignore_command_transaction(&self) -> bool {
        self.ignore_command_transaction
    }

    fn current_transaction(&self) -> Option<TransactionId> {
        self.transaction
    }

    fn has_active_reader(&self) -> bool {
        self.active_reader
    }

    fn cached_procedures(&self) -> &ProcedureCache {
        &self.procedures
    }

    fn try_get_prepared(&self, text: &str) -> Option<PreparedStatements> {
        self.registry.lock().get(text)
    }

    async fn prepare(
        &mut self,
        text: &str,
        _io: IoBehavior,
        cancel: Option<&CancellationToken>,
    ) -> Result<PreparedStatements> {
        Self::check_cancel(cancel)?;
        if let Some(existing) = self.registry.lock().get(text) {
            return Ok(existing);
        }

        let mut writer = PayloadWriter::new();
        write_prepare(&mut writer, text)?;
        self.transmitted.push(writer.into_payload());

        // Acknowledge each statement with an encoded PrepareOk and parse it
        // back, the way a real session consumes the server's response.
        let mut statements = Vec::new();
        for statement in text.split(';').filter(|s| !s.trim().is_empty()) {
            let response = PrepareOk {
                statement_id: self.next_statement_id,
                column_count: 0,
                parameter_count: statement.matches('?').count() as u16,
                warnings: 0,
            }
            .encode();
            self.next_statement_id += 1;

            let ok = PrepareOk::parse(&response)?;
            tracing::trace!(
                text,
                statement_id = ok.statement_id,
                warnings = ok.warnings,
                "prepare acknowledged"
            );
            statements.push(PreparedStatement {
                statement_id: ok.statement_id,
                parameter_count: ok.parameter_count,
                column_count: ok.column_count,
            });
        }
        let prepared = PreparedStatements { statements };
        self.registry.lock().insert(text, prepared.clone());
        Ok(prepared)
    }

    async fn transmit(
        &mut self,
        payload: &[u8],
        _io: IoBehavior,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        Self::check_cancel(cancel)?;
        self.transmitted.push(Bytes::copy_from_slice(payload));
        Ok(())
    }

    async fn recv_payload(
        &mut self,
        _io: IoBehavior,
        cancel: Option<&CancellationToken>,
    ) -> Result<Bytes> {
        Self::check_cancel(cancel)?;
        self.responses.pop_front().ok_or_else(|| {
            Error::Io(Arc::new(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "response script exhausted",
            )))
        })
    }

    fn cancel_sideband(&self) -> Self::Sideband {
        self.sideband.clone()
    }
}

/// Compose an OK payload.
#[must_use]
pub fn ok_payload(affected: u64, more: bool) -> Vec<u8> {
    let mut payload = vec![0x00];
    write_lenenc_int(&mut payload, affected);
    write_lenenc_int(&mut payload, 0);
    let status = if more {
        ServerStatus::MORE_RESULTS_EXISTS
    } else {
        ServerStatus::empty()
    };
    payload.extend_from_slice(&status.bits().to_le_bytes());
    payload.extend_from_slice(&0u16.to_le_bytes());
    payload
}

/// Compose a legacy EOF payload terminating a result set.
#[must_use]
pub fn eof_payload(more: bool) -> Vec<u8> {
    let status = if more {
        ServerStatus::MORE_RESULTS_EXISTS
    } else {
        ServerStatus::empty()
    };
    let mut payload = vec![0xFE, 0x00, 0x00];
    payload.extend_from_slice(&status.bits().to_le_bytes());
    payload
}

/// Compose an ERR payload.
#[must_use]
pub fn err_payload(code: u16, sql_state: &str, message: &str) -> Vec<u8> {
    let mut payload = vec![0xFF];
    payload.extend_from_slice(&code.to_le_bytes());
    payload.push(b'#');
    payload.extend_from_slice(sql_state.as_bytes());
    payload.extend_from_slice(message.as_bytes());
    payload
}

/// Compose a VARCHAR column definition payload.
#[must_use]
pub fn column_definition_payload(name: &str) -> Vec<u8> {
    encode_column_definition(&ColumnDefinition {
        schema: "test".into(),
        table: "t".into(),
        name: name.into(),
        charset: 33,
        column_length: 255,
        column_type: ColumnType::VarString,
        flags: ColumnFlags::empty(),
        decimals: 0,
    })
}

/// Compose a text-protocol row payload.
#[must_use]
pub fn text_row_payload(cells: &[&str]) -> Vec<u8> {
    let mut payload = Vec::new();
    for cell in cells {
        mysql_protocol::codec::write_lenenc_bytes(&mut payload, cell.as_bytes());
    }
    payload
}
