//! End-to-end batch execution against a scripted session.
//!
//! These tests drive the full path: payload creator selection, wire bytes,
//! and the multi-result reader, with the server side played by
//! `ScriptedSession`.

#![allow(clippy::unwrap_used)]

use mysql_client::testing::ScriptedSession;
use mysql_client::{Batch, BatchCommand, BatchParameter, IoBehavior, MySqlValue};

fn two_selects(session: &mut ScriptedSession) -> Batch<'_, ScriptedSession> {
    let mut batch = Batch::new(session);
    batch.add(BatchCommand::new("SELECT 1"));
    batch.add(BatchCommand::new("SELECT 2"));
    batch
}

#[tokio::test]
async fn test_com_multi_payload_framing() {
    let mut session = ScriptedSession::new().with_com_multi(true);
    session.push_ok(0, false);
    session.push_ok(0, false);

    let mut batch = two_selects(&mut session);
    batch
        .execute_non_query(IoBehavior::Asynchronous, None)
        .await
        .unwrap();
    drop(batch);

    let payload = &session.transmitted()[0];
    let mut expected = vec![0xFE];
    expected.extend_from_slice(&[0xFE, 9, 0, 0, 0, 0, 0, 0, 0]);
    expected.extend_from_slice(b"\x03SELECT 1");
    expected.extend_from_slice(&[0xFE, 9, 0, 0, 0, 0, 0, 0, 0]);
    expected.extend_from_slice(b"\x03SELECT 2");
    // One COM_MULTI opcode, two framed sub-commands, no trailing header.
    assert_eq!(&payload[..], &expected[..]);
    assert_eq!(session.transmitted().len(), 1);
}

#[tokio::test]
async fn test_concatenated_payload_without_com_multi() {
    let mut session = ScriptedSession::new();
    session.push_ok(0, true);
    session.push_ok(0, false);

    let mut batch = two_selects(&mut session);
    batch
        .execute_non_query(IoBehavior::Asynchronous, None)
        .await
        .unwrap();
    drop(batch);

    assert_eq!(session.transmitted().len(), 1);
    assert_eq!(&session.transmitted()[0][..], b"\x03SELECT 1;SELECT 2");
}

#[tokio::test]
async fn test_prepared_batch_pipelines_executes_in_order() {
    let mut session = ScriptedSession::new();
    session.push_ok(0, false);
    session.push_ok(0, false);

    let mut batch = two_selects(&mut session);
    batch
        .prepare(IoBehavior::Asynchronous, None)
        .await
        .unwrap();
    batch
        .execute_non_query(IoBehavior::Asynchronous, None)
        .await
        .unwrap();
    drop(batch);

    let transmitted = session.transmitted();
    assert_eq!(transmitted.len(), 4);
    assert_eq!(&transmitted[0][..], b"\x16SELECT 1");
    assert_eq!(&transmitted[1][..], b"\x16SELECT 2");
    // Two sequential COM_STMT_EXECUTE frames, in submission order.
    assert_eq!(transmitted[2][0], 0x17);
    assert_eq!(&transmitted[2][1..5], &1u32.to_le_bytes());
    assert_eq!(transmitted[3][0], 0x17);
    assert_eq!(&transmitted[3][1..5], &2u32.to_le_bytes());
}

#[tokio::test]
async fn test_non_query_aggregates_affected_rows() {
    let mut session = ScriptedSession::new();
    session.push_ok(3, true);
    session.push_ok(5, false);

    let mut batch = Batch::new(&mut session);
    batch.add(BatchCommand::new("UPDATE a SET x = 1"));
    batch.add(BatchCommand::new("UPDATE b SET y = 2"));
    let affected = batch
        .execute_non_query(IoBehavior::Asynchronous, None)
        .await
        .unwrap();
    assert_eq!(affected, 8);
    drop(batch);
    assert_eq!(session.remaining_responses(), 0);
}

#[tokio::test]
async fn test_scalar_returns_first_cell_and_drains() {
    let mut session = ScriptedSession::new();
    session.push_text_result_set(&["v"], &[&["1"], &["2"]], true);
    session.push_text_result_set(&["v"], &[&["9"]], false);

    let mut batch = Batch::new(&mut session);
    batch.add(BatchCommand::new("SELECT 1"));
    let scalar = batch
        .execute_scalar(IoBehavior::Asynchronous, None)
        .await
        .unwrap();
    assert_eq!(scalar, MySqlValue::Text("1".into()));
    drop(batch);
    // The remaining rows and the second result set were fully drained.
    assert_eq!(session.remaining_responses(), 0);
}

#[tokio::test]
async fn test_scalar_null_sentinel_when_no_rows() {
    let mut session = ScriptedSession::new();
    session.push_ok(0, false);

    let mut batch = Batch::new(&mut session);
    batch.add(BatchCommand::new("DO 1"));
    let scalar = batch
        .execute_scalar(IoBehavior::Asynchronous, None)
        .await
        .unwrap();
    assert_eq!(scalar, MySqlValue::Null);
}

#[tokio::test]
async fn test_reader_yields_result_sets_in_submission_order() {
    let mut session = ScriptedSession::new();
    session.push_text_result_set(&["v"], &[&["first"]], true);
    session.push_text_result_set(&["v"], &[&["second"]], false);

    let mut batch = two_selects(&mut session);
    let mut reader = batch
        .execute_reader(IoBehavior::Asynchronous, None)
        .await
        .unwrap();

    assert_eq!(reader.columns()[0].name, "v");
    let row = reader.next_row().await.unwrap().unwrap();
    assert_eq!(row.get(0), Some(&MySqlValue::Text("first".into())));
    assert!(reader.next_row().await.unwrap().is_none());

    assert!(reader.next_result_set().await.unwrap());
    let row = reader.next_row().await.unwrap().unwrap();
    assert_eq!(row.get(0), Some(&MySqlValue::Text("second".into())));

    assert!(!reader.next_result_set().await.unwrap());
}

#[tokio::test]
async fn test_interpolated_parameters_in_concatenated_batch() {
    let mut session = ScriptedSession::new();
    session.push_ok(1, false);

    let mut batch = Batch::new(&mut session);
    batch.add(
        BatchCommand::new("INSERT INTO t VALUES (?, ?)")
            .with_parameter(BatchParameter::new(3i32))
            .with_parameter(BatchParameter::new("it's")),
    );
    batch
        .execute_non_query(IoBehavior::Asynchronous, None)
        .await
        .unwrap();
    drop(batch);

    assert_eq!(
        &session.transmitted()[0][..],
        b"\x03INSERT INTO t VALUES (3, 'it''s')"
    );
}

#[tokio::test]
async fn test_server_error_surfaces_with_sql_state() {
    let mut session = ScriptedSession::new();
    session.push_response(mysql_client::testing::err_payload(
        1146,
        "42S02",
        "Table 'test.missing' doesn't exist",
    ));

    let mut batch = Batch::new(&mut session);
    batch.add(BatchCommand::new("SELECT * FROM missing"));
    let err = batch
        .execute_non_query(IoBehavior::Asynchronous, None)
        .await
        .unwrap_err();
    match err {
        mysql_client::Error::Server { code, sql_state, .. } => {
            assert_eq!(code, 1146);
            assert_eq!(sql_state, "42S02");
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_synchronous_mode_uses_same_path() {
    let mut session = ScriptedSession::new();
    session.push_ok(2, false);

    let mut batch = Batch::new(&mut session);
    batch.add(BatchCommand::new("DELETE FROM t"));
    let affected = batch
        .execute_non_query(IoBehavior::Synchronous, None)
        .await
        .unwrap();
    assert_eq!(affected, 2);
}
