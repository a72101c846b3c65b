//! The external OT backend interface and document addressing.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Stable wire-level identity of a document:
/// `<collection>/<documentId>`.
///
/// Clients and the backend both route subscriptions by this key, so
/// the mapping must not change across releases.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocKey {
    collection: String,
    document_id: String,
}

impl DocKey {
    /// Creates a document key.
    pub fn new(collection: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            document_id: document_id.into(),
        }
    }

    /// The collection part.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The document id part.
    pub fn document_id(&self) -> &str {
        &self.document_id
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.document_id)
    }
}

/// Errors surfaced by the OT backend.
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    /// The document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The backend could not complete the request.
    #[error("backend failure: {0}")]
    Failure(String),
}

/// The external operational-transform engine.
///
/// The gateway never mutates documents itself; it observes candidate
/// snapshots during validation and tells the backend when a change may
/// be finalized. Merge semantics, convergence and broadcast to other
/// subscribers are entirely the backend's responsibility.
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Tentatively applies an operation, returning the candidate new
    /// snapshot without committing it. `create` carries the initial
    /// document payload when the operation creates the document.
    async fn apply(
        &self,
        doc: &DocKey,
        op: &Value,
        create: Option<&Value>,
    ) -> Result<Value, BackendError>;

    /// Finalizes a validated operation: installs the snapshot and
    /// broadcasts to the document's other subscribers.
    async fn commit(&self, doc: &DocKey, op: &Value, snapshot: &Value) -> Result<(), BackendError>;

    /// Fetches the current snapshot, `None` if the document has no
    /// live state.
    async fn fetch(&self, doc: &DocKey) -> Result<Option<Value>, BackendError>;

    /// Deletes the document's live state.
    async fn delete(&self, doc: &DocKey) -> Result<(), BackendError>;
}
