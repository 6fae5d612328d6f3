//! Batch execution entry points.
//!
//! [`Batch::execute_reader`] validates, binds, selects a payload creator,
//! and opens the streaming reader. The [`Batch::execute_non_query`] and
//! [`Batch::execute_scalar`] reductions reuse the same path and drive the
//! reader to completion.

use std::sync::Arc;

use mysql_types::MySqlValue;
use tokio_util::sync::CancellationToken;

use crate::batch::Batch;
use crate::cancel::register_cancel;
use crate::error::Result;
use crate::options::{CommandBehavior, IoBehavior};
use crate::payload::PayloadCreator;
use crate::session::Session;
use crate::stream::BatchReader;

impl<'a, S: Session> Batch<'a, S> {
    /// Execute the batch and return a streaming multi-result reader with
    /// [`CommandBehavior`] default.
    pub async fn execute_reader(
        &mut self,
        io: IoBehavior,
        cancel: Option<CancellationToken>,
    ) -> Result<BatchReader<'_, S>> {
        self.execute_reader_with(CommandBehavior::default(), io, cancel)
            .await
    }

    /// Execute the batch with an explicit reader behavior.
    ///
    /// Payload creator precedence: `Batched` when the server supports
    /// COM_MULTI; otherwise `Single` when every command is already
    /// prepared; otherwise `Concatenated`.
    pub async fn execute_reader_with(
        &mut self,
        behavior: CommandBehavior,
        io: IoBehavior,
        cancel: Option<CancellationToken>,
    ) -> Result<BatchReader<'_, S>> {
        self.reset_command_timeout();
        self.validate()?;

        let id = self.id;
        for command in self.commands.iter_mut() {
            command.bind(id);
            command.set_prepared(self.session.try_get_prepared(command.text()));
        }
        let all_prepared = self.commands.iter().all(|c| c.prepared().is_some());
        let creator = PayloadCreator::select(self.session.supports_com_multi(), all_prepared);
        tracing::debug!(
            batch_id = id,
            ?creator,
            commands = self.commands.len(),
            "executing batch"
        );

        let scope = register_cancel(
            cancel.as_ref(),
            self.session.cancel_sideband(),
            id,
            Arc::clone(&self.cancel_attempts),
        );
        BatchReader::start(
            &mut *self.session,
            &self.commands,
            creator,
            behavior,
            io,
            cancel,
            scope,
        )
        .await
    }

    /// Execute the batch, discard all rows, and return the aggregate of the
    /// affected-row counts across every result set.
    pub async fn execute_non_query(
        &mut self,
        io: IoBehavior,
        cancel: Option<CancellationToken>,
    ) -> Result<u64> {
        let reader = self.execute_reader(io, cancel).await?;
        reader.close().await
    }

    /// Execute the batch and return column 0 of the first row of the first
    /// result set, or [`MySqlValue::Null`] when no row was produced. The
    /// reader is fully drained either way.
    pub async fn execute_scalar(
        &mut self,
        io: IoBehavior,
        cancel: Option<CancellationToken>,
    ) -> Result<MySqlValue> {
        let mut reader = self.execute_reader(io, cancel).await?;
        let scalar = match reader.next_row().await? {
            Some(row) => row.get(0).cloned().unwrap_or(MySqlValue::Null),
            None => MySqlValue::Null,
        };
        reader.close().await?;
        Ok(scalar)
    }
}
