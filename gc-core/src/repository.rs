//! Request and artifact operations used by the dispatcher.
//!
//! Failures are logged with the request they concern and then returned
//! unchanged, so the invocation fails as a whole.

use std::sync::Arc;

use tracing::{debug, error};

use crate::error::{GcError, Result};
use crate::event::{RequestKey, RequestState};
use crate::store::{ArtifactStore, PersistedRequestItem, RequestStore, RequestUpdate};

/// Request records in the key-value table.
#[derive(Clone)]
pub struct Requests {
    store: Arc<dyn RequestStore>,
}

impl Requests {
    pub fn new(store: Arc<dyn RequestStore>) -> Self {
        Self { store }
    }

    /// Save a new request, replacing any record with the same key.
    pub async fn save_request(&self, item: &PersistedRequestItem) -> Result<()> {
        self.store.put_item(item).await.map_err(|e| {
            error!(request_id = %item.request_id, error = %e, "Error saving request");
            e
        })?;
        debug!(request_id = %item.request_id, "Saved request");
        Ok(())
    }

    /// Set the status of a request to PROCESSED.
    pub async fn mark_processed(&self, key: &RequestKey) -> Result<()> {
        let update = RequestUpdate::new(key.clone()).status(RequestState::Processed);
        self.store.update_item(&update).await.map_err(|e| {
            error!(request_id = %key.request_id(), error = %e, "Error updating request state");
            e
        })?;
        debug!(request_id = %key.request_id(), "Marked request as processed");
        Ok(())
    }

    /// Fetch a request, treating records that are not PROCESSED as absent.
    pub async fn get_processed_item(&self, key: &RequestKey) -> Result<Option<PersistedRequestItem>> {
        let item = self.store.get_item(key).await.map_err(|e| {
            error!(request_id = %key.request_id(), error = %e, "Error getting request");
            e
        })?;
        Ok(item.filter(PersistedRequestItem::is_processed))
    }
}

/// Corrected artifacts in the object store.
#[derive(Clone)]
pub struct Artifacts {
    store: Arc<dyn ArtifactStore>,
}

impl Artifacts {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// Fetch the corrected artifact stored under `filename`.
    pub async fn get_corrected_audio(&self, filename: &str) -> Result<String> {
        self.store
            .get_object(filename)
            .await
            .map_err(|e| {
                error!(filename, error = %e, "Error reading corrected audio");
                e
            })?
            .ok_or_else(|| GcError::ArtifactNotFound(filename.to_string()))
    }

    /// Store a corrected artifact under `filename`.
    pub async fn save_corrected_audio(&self, filename: &str, audio: &str) -> Result<()> {
        self.store.put_object(filename, audio).await.map_err(|e| {
            error!(filename, error = %e, "Error saving corrected audio");
            e
        })
    }
}
