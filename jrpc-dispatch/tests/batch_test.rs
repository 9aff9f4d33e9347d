//! Batch dispatch integration tests

use jrpc_core::{codes, RequestMessage, ResponseMessage};
use jrpc_dispatch::{from_fn, from_sync_fn, BatchMode, Dispatcher, MethodDescriptor, ParamType};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn dispatcher(mode: BatchMode, hits: Arc<AtomicUsize>) -> Dispatcher {
    Dispatcher::builder()
        .batch_mode(mode)
        .max_batch_size(8)
        .method(
            MethodDescriptor::new(
                "sleep_then_echo",
                from_fn(|p| async move {
                    let ms: u64 = p.get_as("ms")?;
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok(json!(ms))
                }),
            )
            .required("ms", ParamType::Integer),
        )
        .handler(
            "hit",
            from_sync_fn(move |_| Ok(json!(hits.fetch_add(1, Ordering::SeqCst) + 1))),
        )
        .build()
        .unwrap()
}

async fn call(dispatcher: &Dispatcher, payload: Value) -> Option<Value> {
    dispatcher
        .handle_text(&payload.to_string())
        .await
        .unwrap()
        .map(|text| serde_json::from_str(&text).unwrap())
}

#[tokio::test]
async fn test_notification_outcomes_are_omitted() {
    let hits = Arc::new(AtomicUsize::new(0));
    let d = dispatcher(BatchMode::Parallel, hits.clone());

    let reply = call(
        &d,
        json!([
            {"jsonrpc": "2.0", "method": "hit"},
            {"jsonrpc": "2.0", "method": "hit", "id": 2}
        ]),
    )
    .await
    .unwrap();

    let responses = reply.as_array().unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], json!(2));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_all_notification_batch_has_no_reply() {
    let hits = Arc::new(AtomicUsize::new(0));
    let d = dispatcher(BatchMode::Parallel, hits.clone());

    let reply = call(
        &d,
        json!([
            {"jsonrpc": "2.0", "method": "hit"},
            {"jsonrpc": "2.0", "method": "missing"}
        ]),
    )
    .await;

    assert!(reply.is_none());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_parallel_batch_keeps_request_order() {
    let d = dispatcher(BatchMode::Parallel, Arc::new(AtomicUsize::new(0)));

    let reply = call(
        &d,
        json!([
            {"jsonrpc": "2.0", "method": "sleep_then_echo", "params": [40], "id": "slow"},
            {"jsonrpc": "2.0", "method": "sleep_then_echo", "params": [1], "id": "fast"},
            {"jsonrpc": "2.0", "method": "sleep_then_echo", "params": [20], "id": "mid"}
        ]),
    )
    .await
    .unwrap();

    let ids: Vec<_> = reply.as_array().unwrap().iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!("slow"), json!("fast"), json!("mid")]);
}

#[tokio::test]
async fn test_sequential_batch_observes_earlier_effects() {
    let d = dispatcher(BatchMode::Sequential, Arc::new(AtomicUsize::new(0)));

    let reply = call(
        &d,
        json!([
            {"jsonrpc": "2.0", "method": "hit", "id": 1},
            {"jsonrpc": "2.0", "method": "hit", "id": 2},
            {"jsonrpc": "2.0", "method": "hit", "id": 3}
        ]),
    )
    .await
    .unwrap();

    let results: Vec<_> = reply.as_array().unwrap().iter().map(|r| r["result"].clone()).collect();
    assert_eq!(results, vec![json!(1), json!(2), json!(3)]);
}

#[tokio::test]
async fn test_mixed_batch_isolates_bad_elements() {
    let d = dispatcher(BatchMode::Parallel, Arc::new(AtomicUsize::new(0)));

    let reply = call(
        &d,
        json!([
            {"jsonrpc": "2.0", "method": "hit", "id": 1},
            1,
            {"jsonrpc": "2.0", "method": "missing", "id": 3},
            {"jsonrpc": "2.0", "method": "sleep_then_echo", "params": {"ms": 1, "extra": 0}, "id": 4},
            {"jsonrpc": "1.0", "method": "hit", "id": 5}
        ]),
    )
    .await
    .unwrap();

    let responses = reply.as_array().unwrap();
    assert_eq!(responses.len(), 5);
    assert_eq!(responses[0]["result"], json!(1));
    assert_eq!(responses[1]["error"]["code"], json!(codes::INVALID_REQUEST));
    assert_eq!(responses[1]["id"], Value::Null);
    assert_eq!(responses[2]["error"]["code"], json!(codes::METHOD_NOT_FOUND));
    assert_eq!(responses[3]["error"]["code"], json!(codes::INVALID_PARAMS));
    assert_eq!(responses[4]["error"]["code"], json!(codes::INVALID_REQUEST));
    assert_eq!(responses[4]["id"], json!(5));
}

#[tokio::test]
async fn test_empty_batch_is_a_single_invalid_request() {
    let d = dispatcher(BatchMode::Parallel, Arc::new(AtomicUsize::new(0)));

    let reply = call(&d, json!([])).await.unwrap();

    assert!(reply.is_object());
    assert_eq!(reply["error"]["code"], json!(codes::INVALID_REQUEST));
    assert_eq!(reply["id"], Value::Null);
}

#[tokio::test]
async fn test_oversized_batch_is_rejected_whole() {
    let hits = Arc::new(AtomicUsize::new(0));
    let d = dispatcher(BatchMode::Parallel, hits.clone());
    let batch: Vec<Value> = (0..9)
        .map(|i| json!({"jsonrpc": "2.0", "method": "hit", "id": i}))
        .collect();

    let message = d.dispatch(RequestMessage::Batch(batch)).await.unwrap();

    let response = message.as_single().unwrap();
    assert_eq!(response.error_data().map(|e| e.code), Some(codes::INVALID_REQUEST));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_dispatch_single_message() {
    let d = dispatcher(BatchMode::Parallel, Arc::new(AtomicUsize::new(0)));

    let message = d
        .dispatch(RequestMessage::from(json!({"jsonrpc": "2.0", "method": "hit", "id": 1})))
        .await
        .unwrap();

    assert!(matches!(message, ResponseMessage::Single(_)));
}
