//! Local invocation of the service against a file-backed store.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use gc_core::{handle_event, DispatchConfig, Dispatcher, FileStore, PassthroughCorrector, ResponseEvent};
use serde_json::Value;
use tracing::debug;

/// Read an event from `source` (a path, or `-` for stdin) and dispatch it.
pub async fn handle_invoke(store: FileStore, source: &str, config: DispatchConfig) -> Result<Option<ResponseEvent>> {
    let event = read_event(source)?;
    let store = Arc::new(store);
    let dispatcher = Dispatcher::new(store.clone(), store, Arc::new(PassthroughCorrector), config);

    let response = handle_event(&dispatcher, &event).await?;
    Ok(response)
}

fn read_event(source: &str) -> Result<Value> {
    let content = if source == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read event from stdin")?;
        content
    } else {
        std::fs::read_to_string(Path::new(source))
            .with_context(|| format!("Failed to read event file: {}", source))?
    };

    debug!(source, bytes = content.len(), "Read event");
    serde_json::from_str(&content).with_context(|| format!("Event in {} is not valid JSON", source))
}
