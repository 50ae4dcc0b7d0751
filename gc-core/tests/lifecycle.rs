//! Drives a request through submission, processing and retrieval.

use std::sync::Arc;

use gc_core::{
    handle_event, ArtifactStore, DispatchConfig, Dispatcher, GcError, MemoryStore, PassthroughCorrector,
    Request, RequestKey, RequestState, RequestStore, ResponseStatus,
};
use serde_json::{json, Value};

fn dispatcher(store: &Arc<MemoryStore>) -> Dispatcher {
    let config = DispatchConfig {
        store_corrected_audio: true,
        ..Default::default()
    };
    Dispatcher::new(store.clone(), store.clone(), Arc::new(PassthroughCorrector), config)
}

fn connect(request_id: &str, email: &str) -> Value {
    let body = serde_json::to_string(&Request::new(request_id, email)).unwrap();
    json!({
        "requestContext": {"eventType": "CONNECT", "connectionId": "c-1", "routeKey": "$connect"},
        "body": body
    })
}

#[tokio::test]
async fn request_is_submitted_processed_and_retrieved() {
    let store = Arc::new(MemoryStore::new());
    let dispatcher = dispatcher(&store);
    let key = RequestKey::new("user@example.com", "req-1");

    let submitted = Request::new("req-1", "user@example.com")
        .with_data("c2FtcGxl")
        .with_state(RequestState::New);
    let queued = json!({"Records": [{"body": serde_json::to_string(&submitted).unwrap()}]});
    assert_eq!(handle_event(&dispatcher, &queued).await, Ok(None));
    assert_eq!(
        store.get_item(&key).await.unwrap().and_then(|item| item.state()),
        Some(RequestState::New)
    );

    let pending = handle_event(&dispatcher, &connect("req-1", "user@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pending.status, ResponseStatus::Failure);

    let run = json!({
        "type": "RUN_EVENT",
        "requestId": "req-1",
        "email": "user@example.com",
        "data": "c2FtcGxl"
    });
    assert_eq!(handle_event(&dispatcher, &run).await, Ok(None));
    assert_eq!(
        store.get_object("user@example.com/req-1").await,
        Ok(Some("c2FtcGxl".into()))
    );

    let done = handle_event(&dispatcher, &connect("req-1", "user@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(done.status, ResponseStatus::Processed);
    assert_eq!(done.data.as_deref(), Some("c2FtcGxl"));
    assert_eq!(
        serde_json::to_value(&done).unwrap(),
        json!({
            "requestId": "req-1",
            "email": "user@example.com",
            "status": "PROCESSED",
            "data": "c2FtcGxl"
        })
    );
}

#[tokio::test]
async fn unknown_event_fails_the_invocation() {
    let store = Arc::new(MemoryStore::new());
    let err = handle_event(&dispatcher(&store), &json!({})).await.unwrap_err();
    assert_eq!(err, GcError::UnrecognizedRequestType);
    assert!(err.is_classification());
}

#[tokio::test]
async fn run_event_without_identifiers_fails_cleanly() {
    let store = Arc::new(MemoryStore::new());
    let err = handle_event(&dispatcher(&store), &json!({"type": "RUN_EVENT", "state": "NEW"}))
        .await
        .unwrap_err();
    assert!(matches!(err, GcError::InvalidRequest(_)));
    assert_eq!(store.item_count().await, 0);
}

#[tokio::test]
async fn storage_outage_fails_the_invocation() {
    let store = Arc::new(MemoryStore::new());
    store.fail_with("service unavailable").await;
    let queued = json!({"Records": [{"body": "{\"requestId\":\"r1\",\"email\":\"e1\"}"}]});
    assert_eq!(
        handle_event(&dispatcher(&store), &queued).await,
        Err(GcError::Storage("service unavailable".into()))
    );
}
