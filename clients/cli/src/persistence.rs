//! Direct access to the local data directory.

use anyhow::{Context, Result};
use gc_core::{ArtifactStore, FileStore, PersistedRequestItem, RequestKey, RequestStore};

/// Store the content of `file` as the corrected artifact of a request.
pub async fn handle_put_artifact(store: &FileStore, key: &RequestKey, file: &str) -> Result<String> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read artifact file: {}", file))?;

    let filename = match store.get_item(key).await? {
        Some(item) => item.filename,
        None => key.artifact_filename(),
    };
    store.put_object(&filename, &content).await?;
    Ok(filename)
}

/// Fetch the stored record of a request.
pub async fn handle_show(store: &FileStore, key: &RequestKey) -> Result<PersistedRequestItem> {
    store
        .get_item(key)
        .await?
        .ok_or_else(|| anyhow::format_err!("No record stored for {}", key))
}
