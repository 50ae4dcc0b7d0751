//! File-backed store for running the service outside the cloud.
//!
//! Records are kept as JSON under `requests/<email>/<requestId>.json` and
//! artifacts as plain files under `artifacts/<key>`, both relative to a root
//! data directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::{GcError, Result};
use crate::event::RequestKey;
use crate::store::{ArtifactStore, PersistedRequestItem, RequestStore, RequestUpdate};

/// Request table and artifact store kept in a local directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_dir`. Directories are created on first write.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Default data directory, `~/.grammar-correct/data`.
    pub fn default_dir() -> Result<PathBuf> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| GcError::Config("Could not determine home directory".into()))?;
        Ok(home_dir.join(".grammar-correct").join("data"))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn item_path(&self, key: &RequestKey) -> Result<PathBuf> {
        let email = segment(key.email())?;
        let request_id = segment(key.request_id())?;
        Ok(self
            .base_dir
            .join("requests")
            .join(email)
            .join(format!("{}.json", request_id)))
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(GcError::InvalidRequest(format!(
                "artifact key '{}' must be a relative path without '..'",
                key
            )));
        }
        Ok(self.base_dir.join("artifacts").join(relative))
    }

    async fn read_item(&self, path: &Path) -> Result<Option<PersistedRequestItem>> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_item(&self, path: &Path, item: &PersistedRequestItem) -> Result<()> {
        write_file(path, serde_json::to_string_pretty(item)?.as_bytes()).await
    }
}

/// Validate a key half used as a single path segment.
fn segment(value: &str) -> Result<&str> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\']);
    if invalid {
        return Err(GcError::InvalidRequest(format!(
            "'{}' cannot be used as a storage key",
            value
        )));
    }
    Ok(value)
}

async fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, content).await?;
    debug!(path = %path.display(), "Wrote file");
    Ok(())
}

#[async_trait]
impl RequestStore for FileStore {
    async fn put_item(&self, item: &PersistedRequestItem) -> Result<()> {
        let path = self.item_path(&item.key())?;
        self.write_item(&path, item).await
    }

    async fn update_item(&self, update: &RequestUpdate) -> Result<()> {
        let path = self.item_path(update.key())?;
        let item = match self.read_item(&path).await? {
            Some(mut item) => {
                update.apply_to(&mut item);
                item
            }
            None => update.to_new_item(),
        };
        self.write_item(&path, &item).await
    }

    async fn get_item(&self, key: &RequestKey) -> Result<Option<PersistedRequestItem>> {
        let path = self.item_path(key)?;
        self.read_item(&path).await
    }
}

#[async_trait]
impl ArtifactStore for FileStore {
    async fn get_object(&self, key: &str) -> Result<Option<String>> {
        let path = self.object_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put_object(&self, key: &str, content: &str) -> Result<()> {
        let path = self.object_path(key)?;
        write_file(&path, content.as_bytes()).await
    }
}
