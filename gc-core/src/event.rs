//! Request and response types exchanged with callers.
//!
//! A request travels through three event shapes during its lifetime:
//! - Queue message: a producer submits it for correction
//! - Run event: the processing step marks it as processed
//! - Connect event: a websocket client asks for the corrected result

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GcError, Result};

/// Error message returned to connect-event callers for unknown or unfinished requests.
pub const NOT_FOUND_ERROR: &str = "Request not found";

/// Logical type of an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A request delivered through the queue
    RequestEvent,
    /// A request to process previously submitted data
    RunEvent,
    /// A request invoked directly rather than through the queue
    DirectInvocation,
    /// A websocket connection asking for a result
    ConnectEvent,
}

impl EventKind {
    /// Wire name of the event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::RequestEvent => "REQUEST_EVENT",
            EventKind::RunEvent => "RUN_EVENT",
            EventKind::DirectInvocation => "DIRECT_INVOCATION",
            EventKind::ConnectEvent => "CONNECT_EVENT",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle marker of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestState {
    New,
    Processed,
}

impl RequestState {
    /// Stored representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::New => "NEW",
            RequestState::Processed => "PROCESSED",
        }
    }
}

impl FromStr for RequestState {
    type Err = GcError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NEW" => Ok(RequestState::New),
            "PROCESSED" => Ok(RequestState::Processed),
            other => Err(GcError::Serialization(format!("unknown request state '{}'", other))),
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome reported back to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Processed,
    Failure,
}

/// A unit of work submitted for grammar correction.
///
/// Every field is optional on the wire. Event types that need the owner and
/// identifier go through [`Request::key`], which rejects incomplete requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Identifier, unique within the owner's scope
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Owner of the request, used as the partition key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Payload to correct (base64 audio or text)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    /// Lifecycle marker set by the submitter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<RequestState>,
}

impl Request {
    /// Create a request for the given identifier and owner.
    pub fn new(request_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
            email: Some(email.into()),
            data: None,
            state: None,
        }
    }

    /// Attach a payload.
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Attach a lifecycle marker.
    pub fn with_state(mut self, state: RequestState) -> Self {
        self.state = Some(state);
        self
    }

    /// Composite key of the request, failing if either half is missing or blank.
    pub fn key(&self) -> Result<RequestKey> {
        let email = required(self.email.as_deref(), "email")?;
        let request_id = required(self.request_id.as_deref(), "requestId")?;
        Ok(RequestKey::new(email, request_id))
    }

    /// The payload, failing if it is missing.
    pub fn required_data(&self) -> Result<&str> {
        self.data
            .as_deref()
            .ok_or_else(|| GcError::InvalidRequest("missing field `data`".into()))
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(GcError::InvalidRequest(format!("field `{}` is empty", field))),
        None => Err(GcError::InvalidRequest(format!("missing field `{}`", field))),
    }
}

/// Composite key of a persisted request: owner and request identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestKey {
    /// Partition key (the owner's email)
    pub partition_key: String,
    /// Sort key (the request identifier)
    pub sort_key: String,
}

impl RequestKey {
    pub fn new(email: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            partition_key: email.into(),
            sort_key: request_id.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.partition_key
    }

    pub fn request_id(&self) -> &str {
        &self.sort_key
    }

    /// Object store key under which the corrected artifact lives.
    pub fn artifact_filename(&self) -> String {
        format!("{}/{}", self.partition_key, self.sort_key)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.partition_key, self.sort_key)
    }
}

/// Result returned to a connect-event caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEvent {
    pub request_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    pub status: ResponseStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEvent {
    /// A successful lookup carrying the corrected artifact.
    pub fn processed(key: &RequestKey, data: String) -> Self {
        Self {
            request_id: key.request_id().to_string(),
            email: Some(key.email().to_string()),
            data: Some(data),
            status: ResponseStatus::Processed,
            error: None,
        }
    }

    /// A lookup for a request that is unknown or not yet processed.
    pub fn not_found(key: &RequestKey) -> Self {
        Self {
            request_id: key.request_id().to_string(),
            email: Some(key.email().to_string()),
            data: None,
            status: ResponseStatus::Failure,
            error: Some(NOT_FOUND_ERROR.to_string()),
        }
    }
}
