//! Correlation tests: id assignment, out-of-order responses, protocol
//! errors, cancellation, and channel death.

use std::sync::Arc;
use std::time::Duration;

use probe_rpc::{Connection, RpcError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;

fn connect() -> (Arc<Connection>, mpsc::Receiver<String>, mpsc::Sender<String>) {
    let (out_tx, out_rx) = mpsc::channel(64);
    let (in_tx, in_rx) = mpsc::channel(64);
    (Connection::new(out_tx, in_rx), out_rx, in_tx)
}

// Mirrors the containers generated for Target.createTarget.
#[derive(Debug, Serialize)]
struct CreateTargetParams {
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct CreateTargetReturns {
    #[serde(rename = "targetId")]
    target_id: String,
}

// =============================================================================
// Single-invocation scenarios
// =============================================================================

#[tokio::test]
async fn create_target_serializes_exactly_and_yields_typed_output() {
    let (connection, mut out_rx, in_tx) = connect();

    let call = {
        let connection = Arc::clone(&connection);
        tokio::spawn(async move {
            connection
                .invoke::<_, CreateTargetReturns>(
                    "Target.createTarget",
                    Some(CreateTargetParams {
                        url: "http://example.com".into(),
                        width: Some(800),
                        height: Some(800),
                    }),
                )
                .await
        })
    };

    let frame = out_rx.recv().await.expect("request frame");
    assert_eq!(
        frame,
        r#"{"id":0,"method":"Target.createTarget","params":{"url":"http://example.com","width":800,"height":800}}"#
    );

    in_tx
        .send(r#"{"id":0,"result":{"targetId":"T1"}}"#.into())
        .await
        .unwrap();

    let returns = call.await.unwrap().unwrap();
    assert_eq!(returns.target_id, "T1");
}

#[tokio::test]
async fn error_response_raises_remote_error_without_output() {
    let (connection, mut out_rx, in_tx) = connect();

    let call = {
        let connection = Arc::clone(&connection);
        tokio::spawn(async move {
            connection
                .invoke::<_, CreateTargetReturns>(
                    "Target.createTarget",
                    Some(CreateTargetParams {
                        url: "http://example.com".into(),
                        width: None,
                        height: None,
                    }),
                )
                .await
        })
    };

    let frame = out_rx.recv().await.expect("request frame");
    assert_eq!(
        frame,
        r#"{"id":0,"method":"Target.createTarget","params":{"url":"http://example.com"}}"#,
        "absent optionals stay off the wire"
    );

    in_tx
        .send(r#"{"id":0,"error":{"code":-1,"message":"boom"}}"#.into())
        .await
        .unwrap();

    let err = call.await.unwrap().unwrap_err();
    assert_eq!(
        err,
        RpcError::Remote {
            code: -1,
            message: "boom".into(),
        }
    );
}

#[tokio::test]
async fn unit_invocations_discard_the_result_payload() {
    let (connection, mut out_rx, in_tx) = connect();

    let call = {
        let connection = Arc::clone(&connection);
        tokio::spawn(async move { connection.invoke_unit("Page.enable", None::<()>).await })
    };

    let frame = out_rx.recv().await.expect("request frame");
    assert_eq!(frame, r#"{"id":0,"method":"Page.enable"}"#);

    // result absent entirely: still a success
    in_tx.send(r#"{"id":0}"#.into()).await.unwrap();
    call.await.unwrap().unwrap();
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn out_of_order_responses_resolve_to_their_own_callers() {
    let (connection, mut out_rx, in_tx) = connect();

    let mut calls = Vec::new();
    for i in 0..8 {
        let connection = Arc::clone(&connection);
        let method = format!("Echo.m{i}");
        calls.push((
            method.clone(),
            tokio::spawn(async move {
                connection
                    .invoke_raw(&method, Some(json!({ "n": i })))
                    .await
            }),
        ));
    }

    // Collect all eight requests, then answer them newest-first, echoing
    // each request's own method back in its result.
    let mut frames = Vec::new();
    for _ in 0..8 {
        let frame: Value = serde_json::from_str(&out_rx.recv().await.unwrap()).unwrap();
        frames.push(frame);
    }
    let mut ids: Vec<u64> = frames.iter().map(|f| f["id"].as_u64().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..8).collect::<Vec<u64>>(), "ids are dense from 0");

    for frame in frames.iter().rev() {
        let response = json!({
            "id": frame["id"],
            "result": { "method": frame["method"] }
        });
        in_tx.send(response.to_string()).await.unwrap();
    }

    for (method, call) in calls {
        let result = call.await.unwrap().unwrap();
        assert_eq!(
            result["method"].as_str().unwrap(),
            method,
            "response correlated to the wrong caller"
        );
    }
}

#[tokio::test]
async fn waiting_never_consumes_other_traffic() {
    let (connection, mut out_rx, in_tx) = connect();

    let first = {
        let connection = Arc::clone(&connection);
        tokio::spawn(async move { connection.invoke_raw("A.first", None::<()>).await })
    };
    let _ = out_rx.recv().await.unwrap();
    let second = {
        let connection = Arc::clone(&connection);
        tokio::spawn(async move { connection.invoke_raw("A.second", None::<()>).await })
    };
    let _ = out_rx.recv().await.unwrap();

    // A response for id 1 must pass the id-0 waiter untouched.
    in_tx.send(r#"{"id":1,"result":"second"}"#.into()).await.unwrap();
    assert_eq!(second.await.unwrap().unwrap(), json!("second"));

    in_tx.send(r#"{"id":0,"result":"first"}"#.into()).await.unwrap();
    assert_eq!(first.await.unwrap().unwrap(), json!("first"));
}

// =============================================================================
// Cancellation and channel death
// =============================================================================

#[tokio::test]
async fn abandoned_invocations_drop_late_responses_without_id_reuse() {
    let (connection, mut out_rx, in_tx) = connect();

    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        connection.invoke_raw("Slow.call", None::<()>),
    )
    .await;
    assert!(abandoned.is_err(), "expected the wait to be abandoned");
    let frame: Value = serde_json::from_str(&out_rx.recv().await.unwrap()).unwrap();
    assert_eq!(frame["id"], 0);

    // The late response for the abandoned id is dropped without raising.
    in_tx.send(r#"{"id":0,"result":"late"}"#.into()).await.unwrap();

    // Ids are never reused; the next call gets a fresh id and correlates.
    let call = {
        let connection = Arc::clone(&connection);
        tokio::spawn(async move { connection.invoke_raw("Next.call", None::<()>).await })
    };
    let frame: Value = serde_json::from_str(&out_rx.recv().await.unwrap()).unwrap();
    assert_eq!(frame["id"], 1);
    in_tx.send(r#"{"id":1,"result":"fresh"}"#.into()).await.unwrap();
    assert_eq!(call.await.unwrap().unwrap(), json!("fresh"));
}

#[tokio::test]
async fn closed_channel_fails_every_outstanding_invocation() {
    let (connection, mut out_rx, in_tx) = connect();

    let mut calls = Vec::new();
    for i in 0..3 {
        let connection = Arc::clone(&connection);
        let method = format!("Doomed.m{i}");
        calls.push(tokio::spawn(async move {
            connection.invoke_raw(&method, None::<()>).await
        }));
    }
    for _ in 0..3 {
        let _ = out_rx.recv().await.unwrap();
    }

    drop(in_tx);

    for call in calls {
        assert_eq!(call.await.unwrap().unwrap_err(), RpcError::ChannelClosed);
    }
    assert_eq!(connection.join_reader().await, Ok(()));
    assert_eq!(connection.closed_reason(), Some(RpcError::ChannelClosed));

    // New invocations on a dead connection fail immediately.
    let err = connection.invoke_raw("Late.call", None::<()>).await.unwrap_err();
    assert_eq!(err, RpcError::ChannelClosed);
}

#[tokio::test]
async fn malformed_inbound_message_kills_the_reader_loudly() {
    let (connection, mut out_rx, in_tx) = connect();

    let call = {
        let connection = Arc::clone(&connection);
        tokio::spawn(async move { connection.invoke_raw("Pending.call", None::<()>).await })
    };
    let _ = out_rx.recv().await.unwrap();

    in_tx.send(r#"{"neither": "fish nor fowl"}"#.into()).await.unwrap();

    let err = call.await.unwrap().unwrap_err();
    assert!(matches!(err, RpcError::MalformedMessage(_)));
    assert!(matches!(
        connection.join_reader().await,
        Err(RpcError::MalformedMessage(_))
    ));
    assert!(matches!(
        connection.closed_reason(),
        Some(RpcError::MalformedMessage(_))
    ));
}
