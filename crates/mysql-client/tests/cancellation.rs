//! Cooperative cancellation through the registry and the reader.

#![allow(clippy::unwrap_used)]

use mysql_client::testing::ScriptedSession;
use mysql_client::{Batch, BatchCommand, Error, IoBehavior, MySqlValue};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_cancel_after_first_result_set() {
    let mut session = ScriptedSession::new();
    session.push_text_result_set(&["v"], &[&["1"]], true);
    session.push_text_result_set(&["v"], &[&["2"]], false);

    let token = CancellationToken::new();
    let mut batch = Batch::new(&mut session);
    batch.add(BatchCommand::new("SELECT 1"));
    batch.add(BatchCommand::new("SELECT 2"));
    let batch_id = batch.id();

    {
        let mut reader = batch
            .execute_reader(IoBehavior::Asynchronous, Some(token.clone()))
            .await
            .unwrap();
        let row = reader.next_row().await.unwrap().unwrap();
        assert_eq!(row.get(0), Some(&MySqlValue::Text("1".into())));

        token.cancel();
        // Let the watcher deliver the sideband request before the scope is
        // released.
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }

        let err = reader.next_result_set().await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    assert_eq!(batch.cancel_attempt_count(), 1);

    batch.dispose();
    let err = batch
        .execute_non_query(IoBehavior::Asynchronous, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ObjectDisposed));
    drop(batch);

    assert_eq!(session.cancelled_batches(), vec![batch_id]);
}

#[tokio::test]
async fn test_completed_execution_releases_the_scope() {
    let mut session = ScriptedSession::new();
    session.push_ok(1, false);

    let token = CancellationToken::new();
    let mut batch = Batch::new(&mut session);
    batch.add(BatchCommand::new("DELETE FROM t"));
    batch
        .execute_non_query(IoBehavior::Asynchronous, Some(token.clone()))
        .await
        .unwrap();

    // The registration was dropped with the reader; a late cancellation
    // never reaches the sideband.
    token.cancel();
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    assert_eq!(batch.cancel_attempt_count(), 0);
    drop(batch);
    assert!(session.cancelled_batches().is_empty());
}

#[tokio::test]
async fn test_pre_cancelled_token_aborts_before_transmit() {
    let mut session = ScriptedSession::new();
    let token = CancellationToken::new();
    token.cancel();

    let mut batch = Batch::new(&mut session);
    batch.add(BatchCommand::new("SELECT 1"));
    let err = batch
        .execute_non_query(IoBehavior::Asynchronous, Some(token))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    drop(batch);
    assert!(session.transmitted().is_empty());
}

#[tokio::test]
async fn test_batches_get_distinct_ids() {
    let mut first_session = ScriptedSession::new();
    let mut second_session = ScriptedSession::new();
    let first = Batch::new(&mut first_session);
    let second = Batch::new(&mut second_session);
    assert_ne!(first.id(), second.id());
    assert!(second.id() > first.id());
}
