//! Lambda event handler.
//!
//! Every event the function is subscribed to (queue batches, direct
//! invocations and websocket connections) arrives here as raw JSON and is
//! handed to the core dispatcher.

use gc_core::{handle_event, Dispatcher};
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::info;

/// Handle one Lambda invocation.
///
/// Returns the serialized response for connect events and `null` for every
/// other event type.
pub async fn function_handler(dispatcher: &Dispatcher, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let LambdaEvent { payload, context } = event;
    info!(aws_request_id = %context.request_id, "Received Lambda event");

    match handle_event(dispatcher, &payload).await? {
        Some(response) => Ok(serde_json::to_value(response)?),
        None => Ok(Value::Null),
    }
}
