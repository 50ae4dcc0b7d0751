//! Core types and functionality for the grammar correct service.
//!
//! This crate classifies the events the service is invoked with (queue
//! messages, direct invocations and websocket connections) and dispatches them
//! to the request table and the artifact store.

mod error;
mod event;
mod classifier;
mod config;
mod correction;
mod store;
mod repository;
mod dispatcher;
mod handler;
mod memory;
mod local;

// Re-export core types
pub use error::{GcError, Result};
pub use event::{EventKind, Request, RequestKey, RequestState, ResponseEvent, ResponseStatus, NOT_FOUND_ERROR};
pub use classifier::{classify, ClassifiedEvent};
pub use config::{Config, DispatchConfig};
pub use correction::{Corrector, PassthroughCorrector};
pub use store::{
    epoch_seconds, ArtifactStore, PersistedRequestItem, RequestStore, RequestUpdate, RunItem, UpdateField,
};
pub use repository::{Artifacts, Requests};
pub use dispatcher::Dispatcher;
pub use handler::handle_event;
pub use memory::MemoryStore;
pub use local::FileStore;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
