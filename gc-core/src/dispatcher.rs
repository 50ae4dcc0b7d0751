//! Dispatch of classified events to their side effects.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::classifier::ClassifiedEvent;
use crate::config::DispatchConfig;
use crate::correction::Corrector;
use crate::error::{GcError, Result};
use crate::event::{EventKind, Request, RequestState, ResponseEvent};
use crate::repository::{Artifacts, Requests};
use crate::store::{epoch_seconds, ArtifactStore, PersistedRequestItem, RequestStore, RunItem};

/// Executes the action behind each event type against injected stores.
pub struct Dispatcher {
    requests: Requests,
    artifacts: Artifacts,
    corrector: Arc<dyn Corrector>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        requests: Arc<dyn RequestStore>,
        artifacts: Arc<dyn ArtifactStore>,
        corrector: Arc<dyn Corrector>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            requests: Requests::new(requests),
            artifacts: Artifacts::new(artifacts),
            corrector,
            config,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Run the side effect of `event`.
    ///
    /// Only connect events produce a response. A connect event without a body
    /// is ignored. Direct invocations are rejected as unsupported.
    pub async fn dispatch(&self, event: ClassifiedEvent) -> Result<Option<ResponseEvent>> {
        match event {
            ClassifiedEvent::QueuedRequest(request) => {
                self.save_request(&request).await?;
                Ok(None)
            }
            ClassifiedEvent::Run(request) => {
                self.run(&request).await?;
                Ok(None)
            }
            ClassifiedEvent::DirectInvocation(request) => {
                warn!(request_id = ?request.request_id, "Direct invocations are not supported");
                Err(GcError::UnsupportedRequestType(EventKind::DirectInvocation))
            }
            ClassifiedEvent::Connect(Some(request)) => self.lookup(&request).await.map(Some),
            ClassifiedEvent::Connect(None) => {
                info!("Connect event without a request body, nothing to do");
                Ok(None)
            }
        }
    }

    async fn save_request(&self, request: &Request) -> Result<()> {
        let key = request.key()?;
        if let Some(state) = request.state.filter(|s| *s != RequestState::New) {
            debug!(request_id = %key.request_id(), submitted = %state, "Ignoring submitted state, new requests start as NEW");
        }
        let item = PersistedRequestItem::new(&key, RequestState::New, epoch_seconds(), self.config.request_ttl_secs);
        self.requests.save_request(&item).await?;
        info!(request_id = %key.request_id(), "Request saved");
        Ok(())
    }

    async fn run(&self, request: &Request) -> Result<()> {
        let started = Instant::now();
        let found = request.key().is_ok();
        let outcome = self.process(request).await;

        let run = RunItem::for_outcome(
            found,
            outcome.is_ok(),
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            epoch_seconds(),
            self.config.request_ttl_secs,
        );
        match &outcome {
            Ok(()) => info!(request_id = ?request.request_id, ?run, "Run completed"),
            Err(e) => warn!(request_id = ?request.request_id, ?run, error = %e, "Run failed"),
        }
        outcome
    }

    async fn process(&self, request: &Request) -> Result<()> {
        let key = request.key()?;
        let data = request.required_data()?;

        let corrected = self.corrector.correct(data).await?;
        self.requests.mark_processed(&key).await?;
        if self.config.store_corrected_audio {
            self.artifacts
                .save_corrected_audio(&key.artifact_filename(), &corrected)
                .await?;
        }
        Ok(())
    }

    async fn lookup(&self, request: &Request) -> Result<ResponseEvent> {
        let key = request.key()?;
        let Some(item) = self.requests.get_processed_item(&key).await? else {
            debug!(request_id = %key.request_id(), "No processed request found");
            return Ok(ResponseEvent::not_found(&key));
        };

        let audio = self.artifacts.get_corrected_audio(&item.filename).await?;
        info!(request_id = %key.request_id(), "Returning processed request");
        Ok(ResponseEvent::processed(&key, audio))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::correction::PassthroughCorrector;
    use crate::event::{RequestKey, ResponseStatus, NOT_FOUND_ERROR};
    use crate::memory::MemoryStore;

    struct Uppercase;

    #[async_trait]
    impl Corrector for Uppercase {
        async fn correct(&self, data: &str) -> Result<String> {
            Ok(data.to_uppercase())
        }
    }

    fn dispatcher_with(store: &Arc<MemoryStore>, config: DispatchConfig) -> Dispatcher {
        Dispatcher::new(store.clone(), store.clone(), Arc::new(Uppercase), config)
    }

    fn dispatcher(store: &Arc<MemoryStore>) -> Dispatcher {
        dispatcher_with(store, DispatchConfig::default())
    }

    async fn seed(store: &MemoryStore, key: &RequestKey, status: RequestState, filename: &str) {
        let mut item = PersistedRequestItem::new(key, status, 1, 1);
        item.filename = filename.to_string();
        store.put_item(&item).await.unwrap();
    }

    #[tokio::test]
    async fn queued_request_is_saved_as_new() {
        let store = Arc::new(MemoryStore::new());
        let config = DispatchConfig {
            request_ttl_secs: 30,
            ..Default::default()
        };
        let response = dispatcher_with(&store, config)
            .dispatch(ClassifiedEvent::QueuedRequest(Request::new("r1", "e1").with_data("d")))
            .await
            .unwrap();
        assert_eq!(response, None);

        let item = store.get_item(&RequestKey::new("e1", "r1")).await.unwrap().unwrap();
        assert_eq!(item.state(), Some(RequestState::New));
        assert_eq!(item.filename, "e1/r1");
        assert_eq!(item.ttl - item.timestamp, 30);
    }

    #[tokio::test]
    async fn queued_request_cannot_skip_processing() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = dispatcher(&store);
        let request = Request::new("r1", "e1").with_state(RequestState::Processed);
        dispatcher
            .dispatch(ClassifiedEvent::QueuedRequest(request))
            .await
            .unwrap();
        store.put_object("e1/r1", "AUDIO").await.unwrap();

        let item = store.get_item(&RequestKey::new("e1", "r1")).await.unwrap().unwrap();
        assert_eq!(item.state(), Some(RequestState::New));

        let response = dispatcher
            .dispatch(ClassifiedEvent::Connect(Some(Request::new("r1", "e1"))))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(response.status, ResponseStatus::Failure);
        assert_eq!(response.error.as_deref(), Some(NOT_FOUND_ERROR));
    }

    #[tokio::test]
    async fn connect_for_record_with_unknown_status_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let key = RequestKey::new("e1", "r1");
        let mut item = PersistedRequestItem::new(&key, RequestState::New, 1, 1);
        item.status = "IN_PROGRESS".into();
        store.put_item(&item).await.unwrap();

        let response = dispatcher(&store)
            .dispatch(ClassifiedEvent::Connect(Some(Request::new("r1", "e1"))))
            .await
            .unwrap();
        assert_eq!(response, Some(ResponseEvent::not_found(&key)));
    }

    #[tokio::test]
    async fn failed_run_still_propagates_storage_error() {
        let store = Arc::new(MemoryStore::new());
        store.fail_with("throttled").await;
        let err = dispatcher(&store)
            .dispatch(ClassifiedEvent::Run(Request::new("r1", "e1").with_data("text")))
            .await
            .unwrap_err();
        assert_eq!(err, GcError::Storage("throttled".into()));
    }

    #[tokio::test]
    async fn queued_request_twice_is_one_record() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = dispatcher(&store);
        for _ in 0..2 {
            dispatcher
                .dispatch(ClassifiedEvent::QueuedRequest(Request::new("r1", "e1")))
                .await
                .unwrap();
        }
        assert_eq!(store.item_count().await, 1);
    }

    #[tokio::test]
    async fn queued_request_without_email_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let request = Request {
            request_id: Some("r1".into()),
            ..Default::default()
        };
        let err = dispatcher(&store)
            .dispatch(ClassifiedEvent::QueuedRequest(request))
            .await
            .unwrap_err();
        assert!(matches!(err, GcError::InvalidRequest(_)));
        assert_eq!(store.item_count().await, 0);
    }

    #[tokio::test]
    async fn run_marks_request_processed() {
        let store = Arc::new(MemoryStore::new());
        let key = RequestKey::new("e1", "r1");
        seed(&store, &key, RequestState::New, "e1/r1").await;

        dispatcher(&store)
            .dispatch(ClassifiedEvent::Run(Request::new("r1", "e1").with_data("text")))
            .await
            .unwrap();

        let item = store.get_item(&key).await.unwrap().unwrap();
        assert!(item.is_processed());
        assert_eq!(item.timestamp, 1);
        assert_eq!(store.object_count().await, 0);
    }

    #[tokio::test]
    async fn run_stores_artifact_when_enabled() {
        let store = Arc::new(MemoryStore::new());
        let config = DispatchConfig {
            store_corrected_audio: true,
            ..Default::default()
        };
        dispatcher_with(&store, config)
            .dispatch(ClassifiedEvent::Run(Request::new("r1", "e1").with_data("text")))
            .await
            .unwrap();
        assert_eq!(store.get_object("e1/r1").await, Ok(Some("TEXT".into())));
    }

    #[tokio::test]
    async fn run_without_key_fails_validation() {
        let store = Arc::new(MemoryStore::new());
        let request = Request::default().with_state(RequestState::New);
        let err = dispatcher(&store)
            .dispatch(ClassifiedEvent::Run(request))
            .await
            .unwrap_err();
        assert_eq!(err, GcError::InvalidRequest("missing field `email`".into()));
        assert_eq!(store.item_count().await, 0);
    }

    #[tokio::test]
    async fn run_without_data_fails_validation() {
        let store = Arc::new(MemoryStore::new());
        let err = dispatcher(&store)
            .dispatch(ClassifiedEvent::Run(Request::new("r1", "e1")))
            .await
            .unwrap_err();
        assert_eq!(err, GcError::InvalidRequest("missing field `data`".into()));
        assert_eq!(store.item_count().await, 0);
    }

    #[tokio::test]
    async fn direct_invocation_is_unsupported() {
        let store = Arc::new(MemoryStore::new());
        let err = dispatcher(&store)
            .dispatch(ClassifiedEvent::DirectInvocation(Request::new("r1", "e1")))
            .await
            .unwrap_err();
        assert_eq!(err, GcError::UnsupportedRequestType(EventKind::DirectInvocation));
    }

    #[tokio::test]
    async fn connect_for_unprocessed_request_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &RequestKey::new("e1", "r1"), RequestState::New, "f1").await;
        store.put_object("f1", "AUDIO_CONTENT").await.unwrap();

        let response = dispatcher(&store)
            .dispatch(ClassifiedEvent::Connect(Some(Request::new("r1", "e1"))))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(response.status, ResponseStatus::Failure);
        assert_eq!(response.error.as_deref(), Some(NOT_FOUND_ERROR));
        assert_eq!(response.request_id, "r1");
        assert_eq!(response.email.as_deref(), Some("e1"));
        assert_eq!(response.data, None);
    }

    #[tokio::test]
    async fn connect_for_unknown_request_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let response = dispatcher(&store)
            .dispatch(ClassifiedEvent::Connect(Some(Request::new("r1", "e1"))))
            .await
            .unwrap();
        assert_eq!(response, Some(ResponseEvent::not_found(&RequestKey::new("e1", "r1"))));
    }

    #[tokio::test]
    async fn connect_for_processed_request_returns_artifact() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &RequestKey::new("e1", "r1"), RequestState::Processed, "f1").await;
        store.put_object("f1", "AUDIO_CONTENT").await.unwrap();

        let response = dispatcher(&store)
            .dispatch(ClassifiedEvent::Connect(Some(Request::new("r1", "e1"))))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            response,
            ResponseEvent {
                request_id: "r1".into(),
                email: Some("e1".into()),
                data: Some("AUDIO_CONTENT".into()),
                status: ResponseStatus::Processed,
                error: None,
            }
        );
    }

    #[tokio::test]
    async fn connect_with_missing_artifact_fails() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &RequestKey::new("e1", "r1"), RequestState::Processed, "f1").await;
        let err = dispatcher(&store)
            .dispatch(ClassifiedEvent::Connect(Some(Request::new("r1", "e1"))))
            .await
            .unwrap_err();
        assert_eq!(err, GcError::ArtifactNotFound("f1".into()));
    }

    #[tokio::test]
    async fn connect_without_body_is_ignored() {
        let store = Arc::new(MemoryStore::new());
        let response = dispatcher(&store)
            .dispatch(ClassifiedEvent::Connect(None))
            .await
            .unwrap();
        assert_eq!(response, None);
    }

    #[tokio::test]
    async fn storage_failure_fails_dispatch() {
        let store = Arc::new(MemoryStore::new());
        store.fail_with("throttled").await;
        let err = dispatcher(&store)
            .dispatch(ClassifiedEvent::Connect(Some(Request::new("r1", "e1"))))
            .await
            .unwrap_err();
        assert_eq!(err, GcError::Storage("throttled".into()));
    }

    #[tokio::test]
    async fn passthrough_keeps_data() {
        let store = Arc::new(MemoryStore::new());
        let config = DispatchConfig {
            store_corrected_audio: true,
            ..Default::default()
        };
        Dispatcher::new(store.clone(), store.clone(), Arc::new(PassthroughCorrector), config)
            .dispatch(ClassifiedEvent::Run(Request::new("r1", "e1").with_data("text")))
            .await
            .unwrap();
        assert_eq!(store.get_object("e1/r1").await, Ok(Some("text".into())));
    }
}
