//! Entry point shared by every runtime hosting the service.

use serde_json::Value;
use tracing::{debug, error};

use crate::classifier::classify;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::event::ResponseEvent;

/// Classify an inbound event and run its side effect.
///
/// Errors are logged here and returned so the hosting runtime reports the
/// invocation as failed.
pub async fn handle_event(dispatcher: &Dispatcher, event: &Value) -> Result<Option<ResponseEvent>> {
    let classified = classify(event).map_err(|e| {
        error!(error = %e, "Failed to classify event");
        e
    })?;
    debug!(kind = %classified.kind(), "Classified event");

    dispatcher.dispatch(classified).await.map_err(|e| {
        error!(error = %e, "Failed to handle event");
        e
    })
}
