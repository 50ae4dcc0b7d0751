//! In-memory store implementation for testing and local runs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{GcError, Result};
use crate::event::RequestKey;
use crate::store::{ArtifactStore, PersistedRequestItem, RequestStore, RequestUpdate};

/// Request table and artifact store held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<BTreeMap<RequestKey, PersistedRequestItem>>,
    objects: Mutex<BTreeMap<String, String>>,
    failure: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a storage error.
    pub async fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().await = Some(message.into());
    }

    /// Number of request records held.
    pub async fn item_count(&self) -> usize {
        self.items.lock().await.len()
    }

    /// Number of artifacts held.
    pub async fn object_count(&self) -> usize {
        self.objects.lock().await.len()
    }

    async fn check(&self) -> Result<()> {
        match &*self.failure.lock().await {
            Some(message) => Err(GcError::Storage(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn put_item(&self, item: &PersistedRequestItem) -> Result<()> {
        self.check().await?;
        self.items.lock().await.insert(item.key(), item.clone());
        Ok(())
    }

    async fn update_item(&self, update: &RequestUpdate) -> Result<()> {
        self.check().await?;
        let mut items = self.items.lock().await;
        match items.get_mut(update.key()) {
            Some(item) => update.apply_to(item),
            None => {
                items.insert(update.key().clone(), update.to_new_item());
            }
        }
        Ok(())
    }

    async fn get_item(&self, key: &RequestKey) -> Result<Option<PersistedRequestItem>> {
        self.check().await?;
        Ok(self.items.lock().await.get(key).cloned())
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn get_object(&self, key: &str) -> Result<Option<String>> {
        self.check().await?;
        Ok(self.objects.lock().await.get(key).cloned())
    }

    async fn put_object(&self, key: &str, content: &str) -> Result<()> {
        self.check().await?;
        self.objects
            .lock()
            .await
            .insert(key.to_string(), content.to_string());
        Ok(())
    }
}
