//! Classification of inbound events.
//!
//! The service is invoked with one of three event shapes. Each shape has its own
//! validator that either claims the event, rejects it with a typed decode error,
//! or passes so the next validator can try. Validators run in a fixed order:
//! queue batch, direct invocation, websocket connection.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{GcError, Result};
use crate::event::{EventKind, Request};

/// An inbound event after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedEvent {
    /// A request delivered through the queue
    QueuedRequest(Request),
    /// A request to process submitted data
    Run(Request),
    /// A direct invocation
    DirectInvocation(Request),
    /// A websocket connection, with the request from its body if one was sent
    Connect(Option<Request>),
}

impl ClassifiedEvent {
    /// Type tag of the event.
    pub fn kind(&self) -> EventKind {
        match self {
            ClassifiedEvent::QueuedRequest(_) => EventKind::RequestEvent,
            ClassifiedEvent::Run(_) => EventKind::RunEvent,
            ClassifiedEvent::DirectInvocation(_) => EventKind::DirectInvocation,
            ClassifiedEvent::Connect(_) => EventKind::ConnectEvent,
        }
    }

    /// Decoded request carried by the event.
    pub fn payload(&self) -> Option<&Request> {
        match self {
            ClassifiedEvent::QueuedRequest(request)
            | ClassifiedEvent::Run(request)
            | ClassifiedEvent::DirectInvocation(request) => Some(request),
            ClassifiedEvent::Connect(request) => request.as_ref(),
        }
    }
}

/// Queue delivery wrapper.
#[derive(Debug, Deserialize)]
struct QueueBatch {
    #[serde(rename = "Records")]
    records: Vec<QueueRecord>,
}

#[derive(Debug, Deserialize)]
struct QueueRecord {
    body: String,
}

/// Websocket lifecycle event, reduced to the fields the service reads.
#[derive(Debug, Deserialize)]
struct ConnectionEvent {
    #[serde(default)]
    body: Option<String>,
}

const RUN_EVENT: &str = "RUN_EVENT";
const DIRECT_INVOCATION: &str = "DIRECT_INVOCATION";
const CONNECT: &str = "CONNECT";

/// Determine the logical type of an inbound event and decode its request.
///
/// Fails with [`GcError::UnrecognizedRequestType`] when the event has no
/// `Records`, no recognised `type` and no `requestContext.eventType` of `CONNECT`.
pub fn classify(event: &Value) -> Result<ClassifiedEvent> {
    if let Some(classified) = queue_batch(event)? {
        return Ok(classified);
    }
    if let Some(classified) = direct_event(event)? {
        return Ok(classified);
    }
    if let Some(classified) = connection_event(event)? {
        return Ok(classified);
    }
    Err(GcError::UnrecognizedRequestType)
}

fn queue_batch(event: &Value) -> Result<Option<ClassifiedEvent>> {
    if event.get("Records").is_none() {
        return Ok(None);
    }

    let batch = QueueBatch::deserialize(event)
        .map_err(|e| GcError::MalformedBody(format!("invalid queue batch: {}", e)))?;

    let mut records = batch.records.into_iter();
    let first = records.next().ok_or(GcError::EmptyBatch)?;

    // Only the first message of a batch is handled.
    let dropped = records.count();
    if dropped > 0 {
        warn!(dropped, "Queue batch carries more than one record, ignoring all but the first");
    }

    let request = parse_body(&first.body)?;
    debug!(request_id = ?request.request_id, "Classified queued request");
    Ok(Some(ClassifiedEvent::QueuedRequest(request)))
}

fn direct_event(event: &Value) -> Result<Option<ClassifiedEvent>> {
    let wrap: fn(Request) -> ClassifiedEvent = match event.get("type").and_then(Value::as_str) {
        Some(RUN_EVENT) => ClassifiedEvent::Run,
        Some(DIRECT_INVOCATION) => ClassifiedEvent::DirectInvocation,
        _ => return Ok(None),
    };

    let request = Request::deserialize(event)
        .map_err(|e| GcError::MalformedBody(format!("invalid request: {}", e)))?;
    Ok(Some(wrap(request)))
}

fn connection_event(event: &Value) -> Result<Option<ClassifiedEvent>> {
    let event_type = event
        .get("requestContext")
        .and_then(|context| context.get("eventType"))
        .and_then(Value::as_str);
    if event_type != Some(CONNECT) {
        return Ok(None);
    }

    let connection = ConnectionEvent::deserialize(event)
        .map_err(|e| GcError::MalformedBody(format!("invalid connection event: {}", e)))?;

    // An empty body, or one holding JSON `null`, carries no request.
    let request = match connection.body.as_deref() {
        Some(body) if !body.is_empty() => serde_json::from_str::<Option<Request>>(body)
            .map_err(|e| GcError::MalformedBody(e.to_string()))?,
        _ => None,
    };
    Ok(Some(ClassifiedEvent::Connect(request)))
}

fn parse_body(body: &str) -> Result<Request> {
    serde_json::from_str(body).map_err(|e| GcError::MalformedBody(e.to_string()))
}
