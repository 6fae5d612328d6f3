//! Batch and command model with pre-execution state guards.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use mysql_types::MySqlValue;
use tokio_util::sync::CancellationToken;

use crate::cancel::next_batch_id;
use crate::error::{Error, Result};
use crate::options::{CommandBehavior, IoBehavior, DEFAULT_COMMAND_TIMEOUT_SECS};
use crate::session::{ConnectionState, Session, TransactionId};
use crate::statement_cache::PreparedStatements;

/// The kind of a batch command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchCommandKind {
    /// Plain statement text.
    Text,
    /// A stored procedure name, rendered through the `CALL` helper.
    StoredProcedure,
}

/// An ordered parameter of a batch command.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchParameter {
    pub(crate) name: Option<String>,
    pub(crate) value: MySqlValue,
}

impl BatchParameter {
    /// Create an unnamed (positional) parameter.
    pub fn new(value: impl Into<MySqlValue>) -> Self {
        Self {
            name: None,
            value: value.into(),
        }
    }

    /// Create a named parameter, addressed as `@name` in statement text.
    pub fn named(name: impl Into<String>, value: impl Into<MySqlValue>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
        }
    }

    /// Parameter name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Parameter value.
    #[must_use]
    pub fn value(&self) -> &MySqlValue {
        &self.value
    }
}

/// One logical unit of a batch: statement text, parameters, and behavior.
#[derive(Debug, Clone)]
pub struct BatchCommand {
    text: String,
    kind: BatchCommandKind,
    parameters: Vec<BatchParameter>,
    behavior: CommandBehavior,
    batch_id: Option<u64>,
    prepared: Option<PreparedStatements>,
}

impl BatchCommand {
    /// Create a text command.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: BatchCommandKind::Text,
            parameters: Vec::new(),
            behavior: CommandBehavior::default(),
            batch_id: None,
            prepared: None,
        }
    }

    /// Create a stored-procedure command from the procedure name.
    pub fn stored_procedure(name: impl Into<String>) -> Self {
        Self {
            kind: BatchCommandKind::StoredProcedure,
            ..Self::new(name)
        }
    }

    /// Append a parameter.
    #[must_use]
    pub fn with_parameter(mut self, parameter: BatchParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Set the per-command behavior mask.
    #[must_use]
    pub fn with_behavior(mut self, behavior: CommandBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Statement text (or procedure name for stored-procedure commands).
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Command kind.
    #[must_use]
    pub fn kind(&self) -> BatchCommandKind {
        self.kind
    }

    /// Ordered parameters.
    #[must_use]
    pub fn parameters(&self) -> &[BatchParameter] {
        &self.parameters
    }

    /// Mutable access to the parameter list.
    pub fn parameters_mut(&mut self) -> &mut Vec<BatchParameter> {
        &mut self.parameters
    }

    /// Per-command behavior mask.
    #[must_use]
    pub fn behavior(&self) -> CommandBehavior {
        self.behavior
    }

    /// The id of the batch this command was last bound to.
    #[must_use]
    pub fn batch_id(&self) -> Option<u64> {
        self.batch_id
    }

    /// The prepared form attached to this command, if any.
    #[must_use]
    pub fn prepared(&self) -> Option<&PreparedStatements> {
        self.prepared.as_ref()
    }

    /// Attach (or clear) the prepared form of this command.
    pub fn set_prepared(&mut self, prepared: Option<PreparedStatements>) {
        self.prepared = prepared;
    }

    pub(crate) fn bind(&mut self, batch_id: u64) {
        self.batch_id = Some(batch_id);
    }
}

/// An ordered sequence of commands submitted in one round trip.
///
/// The batch borrows its connection; a reader obtained from
/// [`Batch::execute_reader`](crate::Batch::execute_reader) extends that
/// borrow until it is closed. Disposing a batch forbids further execution
/// but does not affect the connection.
pub struct Batch<'a, S: Session> {
    pub(crate) session: &'a mut S,
    pub(crate) commands: Vec<BatchCommand>,
    pub(crate) transaction: Option<TransactionId>,
    timeout_secs: u32,
    timeout_remaining_secs: u32,
    pub(crate) disposed: bool,
    pub(crate) id: u64,
    pub(crate) cancel_attempts: Arc<AtomicU32>,
}

impl<'a, S: Session> Batch<'a, S> {
    /// Create an empty batch on `session` with a fresh batch id.
    pub fn new(session: &'a mut S) -> Self {
        Self {
            session,
            commands: Vec::new(),
            transaction: None,
            timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            timeout_remaining_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            disposed: false,
            id: next_batch_id(),
            cancel_attempts: Arc::new(AtomicU32::new(0)),
        }
    }

    /// The batch's process-unique id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Append a command.
    pub fn add(&mut self, command: BatchCommand) -> &mut Self {
        self.commands.push(command);
        self
    }

    /// The commands in submission order.
    #[must_use]
    pub fn commands(&self) -> &[BatchCommand] {
        &self.commands
    }

    /// Bind the batch to a transaction for validation against the
    /// connection's current transaction.
    pub fn set_transaction(&mut self, transaction: Option<TransactionId>) -> &mut Self {
        self.transaction = transaction;
        self
    }

    /// Set the command timeout in seconds. Zero disables the timeout.
    pub fn set_timeout(&mut self, seconds: u32) -> &mut Self {
        self.timeout_secs = seconds;
        self.timeout_remaining_secs = seconds;
        self
    }

    /// The configured command timeout in seconds.
    #[must_use]
    pub fn command_timeout(&self) -> u32 {
        self.timeout_secs
    }

    /// Restart the command-timeout counter. Called at execute time;
    /// enforcement lives in the session.
    pub fn reset_command_timeout(&mut self) {
        self.timeout_remaining_secs = self.timeout_secs;
    }

    /// Seconds left on the command-timeout counter.
    #[must_use]
    pub fn command_timeout_remaining(&self) -> u32 {
        self.timeout_remaining_secs
    }

    /// How many times cancellation has been attempted for this batch.
    #[must_use]
    pub fn cancel_attempt_count(&self) -> u32 {
        self.cancel_attempts.load(Ordering::Relaxed)
    }

    /// Mark the batch used; further execution fails with
    /// [`Error::ObjectDisposed`].
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    /// Whether the batch has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Register every distinct command text with the session's prepared
    /// statement registry.
    ///
    /// Preparation is serialized: each COM_STMT_PREPARE response is awaited
    /// before the next command is prepared. Texts already present in the
    /// registry are reused, so preparing an identical batch twice causes at
    /// most one round trip per distinct text. Under the connection's
    /// `IgnorePrepare` flag this validates and returns without touching the
    /// wire.
    pub async fn prepare(
        &mut self,
        io: IoBehavior,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        self.validate_for_prepare()?;
        if self.session.ignore_prepare() {
            tracing::debug!(batch_id = self.id, "IgnorePrepare set; skipping preparation");
            return Ok(());
        }

        for command in self.commands.iter_mut() {
            if let Some(existing) = self.session.try_get_prepared(command.text()) {
                command.set_prepared(Some(existing));
                continue;
            }
            tracing::debug!(batch_id = self.id, text = command.text(), "preparing command");
            let prepared = self.session.prepare(command.text(), io, cancel).await?;
            command.set_prepared(Some(prepared));
        }
        Ok(())
    }

    /// Pre-execute guards, in order; the first failure is returned.
    pub(crate) fn validate(&self) -> Result<()> {
        self.validate_inner(false)
    }

    /// Pre-prepare guards: as [`Batch::validate`], but the connection must
    /// be strictly `Open`, no reader may be open, and every command must be
    /// plain text.
    pub(crate) fn validate_for_prepare(&self) -> Result<()> {
        self.validate_inner(true)?;
        if self.session.has_active_reader() {
            return Err(Error::InvalidOperation(
                "a reader is already open on this connection".into(),
            ));
        }
        for command in &self.commands {
            if command.kind() != BatchCommandKind::Text {
                return Err(Error::Unsupported(
                    "only text commands can be prepared".into(),
                ));
            }
        }
        Ok(())
    }

    fn validate_inner(&self, require_open: bool) -> Result<()> {
        if self.disposed {
            return Err(Error::ObjectDisposed);
        }

        let state = self.session.state();
        let state_ok = match state {
            ConnectionState::Open => true,
            ConnectionState::Connecting => !require_open,
            _ => false,
        };
        if !state_ok {
            return Err(Error::InvalidOperation(format!(
                "connection is not available; state: {state}"
            )));
        }

        if !self.session.ignore_command_transaction()
            && self.transaction != self.session.current_transaction()
        {
            return Err(Error::InvalidOperation(
                "the batch's transaction must be the connection's active transaction".into(),
            ));
        }

        if self.commands.is_empty() {
            return Err(Error::InvalidOperation(
                "the batch must contain at least one command".into(),
            ));
        }

        for command in &self.commands {
            if command.text().trim().is_empty() {
                return Err(Error::InvalidOperation(
                    "command text must be non-empty".into(),
                ));
            }
            if command.behavior().contains(CommandBehavior::CLOSE_CONNECTION) {
                return Err(Error::Unsupported(
                    "CommandBehavior::CLOSE_CONNECTION is not supported".into(),
                ));
            }
        }
        Ok(())
    }
}
