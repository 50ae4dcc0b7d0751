//! Persistence collaborators and the records they hold.
//!
//! The service talks to two stores: a key-value table of request records and
//! an object store holding corrected artifacts. Both are traits so handles can
//! be injected into the dispatcher and substituted in tests.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::event::{RequestKey, RequestState};

/// Durable record of a request, keyed by owner and request identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRequestItem {
    pub partition_key: String,
    pub sort_key: String,
    pub email: String,
    pub request_id: String,
    /// Stored lifecycle marker. Kept verbatim so records written by other
    /// producers, with unknown or missing values, still load as unprocessed.
    #[serde(default)]
    pub status: String,
    /// Object store key of the corrected artifact
    pub filename: String,
    /// Expiry, in epoch seconds
    pub ttl: u64,
    /// Creation time, in epoch seconds
    pub timestamp: u64,
}

impl PersistedRequestItem {
    /// Create a record for `key` created at `timestamp` and expiring `ttl_secs` later.
    pub fn new(key: &RequestKey, status: RequestState, timestamp: u64, ttl_secs: u64) -> Self {
        Self {
            partition_key: key.email().to_string(),
            sort_key: key.request_id().to_string(),
            email: key.email().to_string(),
            request_id: key.request_id().to_string(),
            status: status.as_str().to_string(),
            filename: key.artifact_filename(),
            ttl: timestamp.saturating_add(ttl_secs),
            timestamp,
        }
    }

    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.partition_key.clone(), self.sort_key.clone())
    }

    /// Lifecycle state, or `None` if the stored marker is not a known state.
    pub fn state(&self) -> Option<RequestState> {
        self.status.parse().ok()
    }

    pub fn is_processed(&self) -> bool {
        self.state() == Some(RequestState::Processed)
    }
}

/// A single field assignment of a [`RequestUpdate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateField {
    Status(RequestState),
    Filename(String),
    Ttl(u64),
}

impl UpdateField {
    /// Attribute name the assignment targets.
    pub fn attribute(&self) -> &'static str {
        match self {
            UpdateField::Status(_) => "status",
            UpdateField::Filename(_) => "filename",
            UpdateField::Ttl(_) => "ttl",
        }
    }

    fn apply(&self, item: &mut PersistedRequestItem) {
        match self {
            UpdateField::Status(status) => item.status = status.as_str().to_string(),
            UpdateField::Filename(filename) => item.filename = filename.clone(),
            UpdateField::Ttl(ttl) => item.ttl = *ttl,
        }
    }
}

/// Partial update of a request record.
///
/// Only the fields of [`PersistedRequestItem`] that may change after creation can
/// be set. Each field is assigned at most once; setting it again replaces the
/// earlier value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUpdate {
    key: RequestKey,
    fields: Vec<UpdateField>,
}

impl RequestUpdate {
    pub fn new(key: RequestKey) -> Self {
        Self {
            key,
            fields: Vec::new(),
        }
    }

    pub fn status(self, status: RequestState) -> Self {
        self.set(UpdateField::Status(status))
    }

    pub fn filename(self, filename: impl Into<String>) -> Self {
        self.set(UpdateField::Filename(filename.into()))
    }

    pub fn ttl(self, ttl: u64) -> Self {
        self.set(UpdateField::Ttl(ttl))
    }

    fn set(mut self, field: UpdateField) -> Self {
        self.fields.retain(|f| f.attribute() != field.attribute());
        self.fields.push(field);
        self
    }

    pub fn key(&self) -> &RequestKey {
        &self.key
    }

    pub fn fields(&self) -> &[UpdateField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Apply the assignments to an in-memory record.
    pub fn apply_to(&self, item: &mut PersistedRequestItem) {
        for field in &self.fields {
            field.apply(item);
        }
    }

    /// Record produced when the update targets a key that does not exist yet.
    ///
    /// Matches the table's behaviour of creating the item from the key and the
    /// assigned attributes.
    pub fn to_new_item(&self) -> PersistedRequestItem {
        let mut item = PersistedRequestItem::new(&self.key, RequestState::New, 0, 0);
        self.apply_to(&mut item);
        item
    }
}

/// Statistics of a single run-event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunItem {
    pub requests_processed: u32,
    pub requests_found: u32,
    pub requests_failed: u32,
    /// Processing time in milliseconds
    pub duration: u64,
    pub ttl: u64,
    pub timestamp: u64,
}

impl RunItem {
    /// Statistics of a run over a single request.
    ///
    /// `found` is whether the request carried a usable key, `succeeded` whether
    /// processing completed.
    pub fn for_outcome(found: bool, succeeded: bool, duration: u64, timestamp: u64, ttl_secs: u64) -> Self {
        Self {
            requests_processed: u32::from(succeeded),
            requests_found: u32::from(found),
            requests_failed: u32::from(!succeeded),
            duration,
            ttl: timestamp.saturating_add(ttl_secs),
            timestamp,
        }
    }
}

/// Key-value table of request records.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Insert or replace a record.
    async fn put_item(&self, item: &PersistedRequestItem) -> Result<()>;

    /// Set the given fields on a record, creating it if absent.
    async fn update_item(&self, update: &RequestUpdate) -> Result<()>;

    /// Fetch a record by key.
    async fn get_item(&self, key: &RequestKey) -> Result<Option<PersistedRequestItem>>;
}

/// Object store holding corrected artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Fetch an object's content, or `None` if the key does not exist.
    async fn get_object(&self, key: &str) -> Result<Option<String>>;

    /// Write an object, replacing any previous content.
    async fn put_object(&self, key: &str, content: &str) -> Result<()>;
}

/// Current time in epoch seconds.
pub fn epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
