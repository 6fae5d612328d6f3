//! Cancellation registry.
//!
//! Every batch is issued a process-unique id at construction. When an
//! execution starts with an external [`CancellationToken`], the registry
//! spawns a watcher that delivers the batch id to the session's cancel
//! sideband the moment the token fires. The returned [`CancellationScope`]
//! aborts the watcher when dropped, which happens when execution completes
//! or the batch is disposed.
//!
//! Cancellation is best-effort and cooperative: between the moment the
//! token fires and the moment the server acknowledges, reads in progress
//! may still complete normally.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::session::CancelSideband;

static NEXT_BATCH_ID: AtomicU64 = AtomicU64::new(1);

/// Issue the next process-unique batch id.
pub(crate) fn next_batch_id() -> u64 {
    NEXT_BATCH_ID.fetch_add(1, Ordering::Relaxed)
}

/// Scope guard for a registered cancellation watcher.
///
/// Dropping the scope unregisters the watcher; a token that fires afterwards
/// has no effect on the batch.
#[derive(Debug)]
pub struct CancellationScope {
    watcher: JoinHandle<()>,
}

impl Drop for CancellationScope {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

/// Register a cancel callback against an external token.
///
/// Returns `None` when no token is supplied or when no async runtime is
/// available to host the watcher (synchronous executions outside a runtime
/// still honor cancellation at suspension-point polls).
pub(crate) fn register_cancel<C: CancelSideband>(
    token: Option<&CancellationToken>,
    sideband: C,
    batch_id: u64,
    attempts: Arc<AtomicU32>,
) -> Option<CancellationScope> {
    let token = token?.clone();
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        tracing::debug!(batch_id, "no runtime available; cancel watcher not registered");
        return None;
    };

    let watcher = handle.spawn(async move {
        token.cancelled().await;
        attempts.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(batch_id, "cancellation token fired; signalling sideband");
        sideband.cancel(batch_id);
    });
    Some(CancellationScope { watcher })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    struct RecordingSideband {
        cancelled: Arc<Mutex<Vec<u64>>>,
    }

    impl CancelSideband for RecordingSideband {
        fn cancel(&self, batch_id: u64) {
            self.cancelled.lock().push(batch_id);
        }
    }

    #[test]
    fn test_batch_ids_are_unique_and_increasing() {
        let first = next_batch_id();
        let second = next_batch_id();
        assert!(second > first);
    }

    #[test]
    fn test_no_token_means_no_scope() {
        let attempts = Arc::new(AtomicU32::new(0));
        let scope = register_cancel(None, RecordingSideband::default(), 1, attempts);
        assert!(scope.is_none());
    }

    #[tokio::test]
    async fn test_token_fire_reaches_sideband() {
        let sideband = RecordingSideband::default();
        let attempts = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();

        let scope = register_cancel(Some(&token), sideband.clone(), 42, Arc::clone(&attempts));
        assert!(scope.is_some());

        token.cancel();
        // Yield until the watcher runs.
        for _ in 0..100 {
            if !sideband.cancelled.lock().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(&*sideband.cancelled.lock(), &[42]);
        assert_eq!(attempts.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_dropped_scope_unregisters() {
        let sideband = RecordingSideband::default();
        let attempts = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();

        let scope = register_cancel(Some(&token), sideband.clone(), 7, Arc::clone(&attempts));
        drop(scope);

        token.cancel();
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert!(sideband.cancelled.lock().is_empty());
        assert_eq!(attempts.load(Ordering::Relaxed), 0);
    }
}
