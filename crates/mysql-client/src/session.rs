//! The session abstraction consumed by the batch execution core.
//!
//! A [`Session`] is an already-authenticated connection: it owns framing
//! (packet headers, 16 MiB splits), the transport, and the prepared
//! statement registry. The core borrows it exclusively for the duration of
//! an execution and speaks to it in whole payloads.

use std::collections::HashMap;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::options::IoBehavior;
use crate::statement_cache::PreparedStatements;

/// Connection state as observed by validation guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection is established.
    Closed,
    /// The connection handshake is in progress.
    Connecting,
    /// The connection is ready for commands.
    Open,
    /// A command is executing and a reader is open.
    Executing,
    /// The connection is unusable after a protocol or transport fault.
    Failed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Closed => "Closed",
            Self::Connecting => "Connecting",
            Self::Open => "Open",
            Self::Executing => "Executing",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Identifier of a server-side transaction, used to check that a batch is
/// bound to the transaction currently active on its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(pub u64);

/// A parameter descriptor of a cached stored procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureParameter {
    /// Parameter name without the `@` prefix.
    pub name: String,
}

/// Cached metadata for a stored procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedProcedure {
    /// Fully qualified procedure name.
    pub name: String,
    /// Parameter descriptors in declaration order.
    pub parameters: Vec<ProcedureParameter>,
}

impl CachedProcedure {
    /// Render the `CALL` invocation for this procedure with `argument_count`
    /// comma-separated argument slots.
    #[must_use]
    pub fn call_text(&self, arguments: &[String]) -> String {
        let mut text = String::with_capacity(self.name.len() + 8);
        text.push_str("CALL ");
        text.push_str(&self.name);
        text.push('(');
        text.push_str(&arguments.join(","));
        text.push(')');
        text
    }
}

/// Read-only map from fully qualified procedure name to cached metadata.
///
/// A `None` value is a tombstone: the procedure was looked up and does not
/// exist.
pub type ProcedureCache = HashMap<String, Option<CachedProcedure>>;

/// Out-of-band cancellation delivery.
///
/// Implementations deliver a `KILL QUERY`-style request for the given batch
/// on a sideband channel (typically a second connection). Delivery is
/// best-effort and must not touch the session's primary stream.
pub trait CancelSideband: Send + Sync + 'static {
    /// Request cancellation of the batch with the given id.
    fn cancel(&self, batch_id: u64);
}

/// An authenticated MySQL session as consumed by the batch core.
#[allow(async_fn_in_trait)]
pub trait Session {
    /// Handle used to deliver out-of-band cancellation.
    type Sideband: CancelSideband + Clone;

    /// Current connection state.
    fn state(&self) -> ConnectionState;

    /// Whether the server negotiated MariaDB COM_MULTI support.
    fn supports_com_multi(&self) -> bool;

    /// Whether `Prepare` calls should be accepted but not sent.
    fn ignore_prepare(&self) -> bool;

    /// Whether transaction binding checks are disabled on this connection.
    fn ignore_command_transaction(&self) -> bool;

    /// The connection's default I/O behavior.
    fn default_io_behavior(&self) -> IoBehavior {
        IoBehavior::Asynchronous
    }

    /// The transaction currently active on this connection, if any.
    fn current_transaction(&self) -> Option<TransactionId>;

    /// Whether a result reader is currently open on this connection.
    fn has_active_reader(&self) -> bool;

    /// Cached stored-procedure metadata.
    fn cached_procedures(&self) -> &ProcedureCache;

    /// Look up the prepared form of a command text in the registry.
    fn try_get_prepared(&self, text: &str) -> Option<PreparedStatements>;

    /// Prepare a command text, transmitting COM_STMT_PREPARE and awaiting
    /// its response. Idempotent by text: preparing an already registered
    /// text returns the existing handles without a round trip.
    async fn prepare(
        &mut self,
        text: &str,
        io: IoBehavior,
        cancel: Option<&CancellationToken>,
    ) -> Result<PreparedStatements>;

    /// Transmit one framed command payload.
    async fn transmit(
        &mut self,
        payload: &[u8],
        io: IoBehavior,
        cancel: Option<&CancellationToken>,
    ) -> Result<()>;

    /// Receive the next packet payload.
    async fn recv_payload(
        &mut self,
        io: IoBehavior,
        cancel: Option<&CancellationToken>,
    ) -> Result<Bytes>;

    /// Obtain a handle for out-of-band cancellation delivery.
    fn cancel_sideband(&self) -> Self::Sideband;
}
