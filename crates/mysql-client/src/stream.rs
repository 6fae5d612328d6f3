//! Multi-result streaming reader.
//!
//! A [`BatchReader`] drives the session through the response stream of an
//! executed batch: an outer sequence of result sets and an inner sequence
//! of rows. The inner sequence is always exhausted before the outer one
//! advances, so protocol framing is preserved.
//!
//! The reader tracks how many protocol-command responses are still
//! outstanding from the last transmitted payload. A statement terminator
//! with `MORE_RESULTS_EXISTS` continues the same response; a final
//! terminator moves to the next outstanding response; and when none remain,
//! the payload creator is asked for the next command (which is how the
//! Single creator pipelines one COM_STMT_EXECUTE at a time). When the
//! creator is exhausted the reader is finished and the cancellation scope
//! is released.

use std::collections::VecDeque;

use mysql_protocol::column::ColumnDefinition;
use mysql_protocol::packet::{is_resultset_terminator, ErrPayload, OkPayload, QueryResponse};
use mysql_protocol::row::{decode_binary_row, decode_text_row};
use mysql_protocol::PayloadWriter;
use mysql_types::MySqlValue;
use tokio_util::sync::CancellationToken;

use crate::batch::BatchCommand;
use crate::cancel::CancellationScope;
use crate::error::{Error, Result};
use crate::options::{CommandBehavior, IoBehavior};
use crate::payload::{CommandCursor, PayloadCreator};
use crate::session::Session;

/// One row of a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<MySqlValue>,
}

impl Row {
    /// Value of the column at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&MySqlValue> {
        self.cells.get(index)
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Consume the row, yielding its values in column order.
    #[must_use]
    pub fn into_values(self) -> Vec<MySqlValue> {
        self.cells
    }
}

#[derive(Debug, Clone, Copy)]
enum ReaderState {
    /// Inside a result set with rows pending.
    Rows { binary: bool },
    /// The current result set is consumed; `more` carries the terminator's
    /// MORE_RESULTS_EXISTS flag.
    Drained { more: bool },
    /// Every command's response has been consumed.
    Finished,
}

/// Streaming reader over the result sets of an executed batch.
///
/// Holds the session exclusively until dropped or closed.
pub struct BatchReader<'a, S: Session> {
    session: &'a mut S,
    commands: &'a [BatchCommand],
    cursor: CommandCursor,
    creator: PayloadCreator,
    behavior: CommandBehavior,
    io: IoBehavior,
    cancel: Option<CancellationToken>,
    scope: Option<CancellationScope>,
    /// Binary-protocol flag per outstanding protocol-command response.
    pending: VecDeque<bool>,
    state: ReaderState,
    columns: Vec<ColumnDefinition>,
    affected: u64,
    rows_read_in_set: u64,
}

impl<S: Session> std::fmt::Debug for BatchReader<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchReader")
            .field("behavior", &self.behavior)
            .field("io", &self.io)
            .field("state", &self.state)
            .field("affected", &self.affected)
            .field("rows_read_in_set", &self.rows_read_in_set)
            .finish()
    }
}

impl<'a, S: Session> BatchReader<'a, S> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn start(
        session: &'a mut S,
        commands: &'a [BatchCommand],
        creator: PayloadCreator,
        behavior: CommandBehavior,
        io: IoBehavior,
        cancel: Option<CancellationToken>,
        scope: Option<CancellationScope>,
    ) -> Result<Self> {
        let mut reader = Self {
            session,
            commands,
            cursor: CommandCursor::new(),
            creator,
            behavior,
            io,
            cancel,
            scope,
            pending: VecDeque::new(),
            state: ReaderState::Drained { more: false },
            columns: Vec::new(),
            affected: 0,
            rows_read_in_set: 0,
        };
        if reader.write_next_payload().await? {
            reader.read_result_header().await?;
        } else {
            reader.finish();
        }
        Ok(reader)
    }

    /// Column definitions of the current result set; empty for rowless
    /// results.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Aggregate of the affected-row counts reported so far.
    #[must_use]
    pub fn records_affected(&self) -> u64 {
        self.affected
    }

    /// Read the next row of the current result set.
    ///
    /// Returns `None` once the result set is exhausted; the reader is then
    /// positioned to advance with [`BatchReader::next_result_set`].
    pub async fn next_row(&mut self) -> Result<Option<Row>> {
        self.check_cancel()?;
        let ReaderState::Rows { binary } = self.state else {
            return Ok(None);
        };

        loop {
            let payload = self.session.recv_payload(self.io, self.cancel.as_ref()).await?;
            if is_resultset_terminator(&payload) {
                let ok = OkPayload::parse(&payload)?;
                self.affected += ok.affected_rows;
                self.state = ReaderState::Drained {
                    more: ok.more_results(),
                };
                return Ok(None);
            }
            if payload.first() == Some(&0xFF) {
                self.state = ReaderState::Finished;
                return Err(ErrPayload::parse(&payload)?.into());
            }

            let cells = if binary {
                decode_binary_row(&payload, &self.columns)?
            } else {
                decode_text_row(&payload, &self.columns)?
            };
            if self.behavior.contains(CommandBehavior::SINGLE_ROW) && self.rows_read_in_set >= 1 {
                // Rows past the first are read off the wire and discarded.
                continue;
            }
            self.rows_read_in_set += 1;
            return Ok(Some(Row { cells }));
        }
    }

    /// Advance to the next result set, draining any rows left in the
    /// current one first.
    ///
    /// Returns `false` when every command's results have been consumed.
    pub async fn next_result_set(&mut self) -> Result<bool> {
        self.check_cancel()?;
        while self.next_row().await?.is_some() {}

        if self.behavior.contains(CommandBehavior::SINGLE_RESULT) {
            // Only the first result set is surfaced; drain the rest.
            while self.advance().await? {
                while self.next_row().await?.is_some() {}
            }
            return Ok(false);
        }

        self.advance().await
    }

    /// Drain the remaining rows and result sets, returning the
    /// affected-row aggregate.
    pub async fn close(mut self) -> Result<u64> {
        loop {
            while self.next_row().await?.is_some() {}
            if !self.advance().await? {
                break;
            }
        }
        Ok(self.affected)
    }

    async fn advance(&mut self) -> Result<bool> {
        match self.state {
            ReaderState::Finished => Ok(false),
            // The current result set still has rows; it remains active.
            ReaderState::Rows { .. } => Ok(true),
            ReaderState::Drained { more } => {
                if more {
                    self.read_result_header().await?;
                    return Ok(true);
                }
                self.pending.pop_front();
                if !self.pending.is_empty() {
                    self.read_result_header().await?;
                    return Ok(true);
                }
                if self.write_next_payload().await? {
                    self.read_result_header().await?;
                    return Ok(true);
                }
                self.finish();
                Ok(false)
            }
        }
    }

    async fn write_next_payload(&mut self) -> Result<bool> {
        let before = self.cursor;
        let mut writer = PayloadWriter::new();
        let wrote = {
            let procedures = self.session.cached_procedures();
            self.creator
                .write_query(self.commands, &mut self.cursor, procedures, &mut writer)?
        };
        if !wrote {
            return Ok(false);
        }
        let payload = writer.into_payload();
        self.session
            .transmit(&payload, self.io, self.cancel.as_ref())
            .await?;
        self.pending = self.emitted_kinds(before);
        Ok(true)
    }

    /// Binary-protocol flags for the responses of the protocol commands
    /// emitted by the last `write_query` call, in emission order.
    fn emitted_kinds(&self, before: CommandCursor) -> VecDeque<bool> {
        match self.creator {
            PayloadCreator::Single => {
                VecDeque::from([self.commands[before.command_index].prepared().is_some()])
            }
            PayloadCreator::Concatenated => VecDeque::from([false]),
            PayloadCreator::Batched => {
                let mut kinds = VecDeque::new();
                let mut sub = before.sub_position;
                for command in &self.commands[before.command_index..] {
                    match command.prepared() {
                        Some(prepared) => {
                            for _ in sub..prepared.statements.len() {
                                kinds.push_back(true);
                            }
                        }
                        None => kinds.push_back(false),
                    }
                    sub = 0;
                }
                kinds
            }
        }
    }

    async fn read_result_header(&mut self) -> Result<()> {
        let payload = self.session.recv_payload(self.io, self.cancel.as_ref()).await?;
        match QueryResponse::parse(&payload)? {
            QueryResponse::Ok(ok) => {
                self.affected += ok.affected_rows;
                self.columns.clear();
                self.rows_read_in_set = 0;
                self.state = ReaderState::Drained {
                    more: ok.more_results(),
                };
            }
            QueryResponse::ResultSet { column_count } => {
                let mut columns = Vec::with_capacity(column_count as usize);
                for _ in 0..column_count {
                    let definition = self
                        .session
                        .recv_payload(self.io, self.cancel.as_ref())
                        .await?;
                    columns.push(ColumnDefinition::parse(&definition)?);
                }
                let binary = self.pending.front().copied().unwrap_or(false);
                self.columns = columns;
                self.rows_read_in_set = 0;
                self.state = ReaderState::Rows { binary };
            }
            QueryResponse::Err(err) => {
                self.state = ReaderState::Finished;
                return Err(err.into());
            }
            QueryResponse::LocalInfile => {
                self.state = ReaderState::Finished;
                return Err(Error::Unsupported(
                    "LOCAL INFILE requests are not supported".into(),
                ));
            }
        }
        Ok(())
    }

    fn check_cancel(&self) -> Result<()> {
        if let Some(token) = &self.cancel {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }
        }
        Ok(())
    }

    fn finish(&mut self) {
        self.state = ReaderState::Finished;
        self.pending.clear();
        // Execution is complete; release the cancellation registration.
        self.scope = None;
    }
}
