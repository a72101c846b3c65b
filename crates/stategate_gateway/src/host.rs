//! Host-supplied callbacks.

use crate::session::User;
use async_trait::async_trait;
use serde_json::Value;
use stategate_registry::ContentMetadata;
use thiserror::Error;

/// A host callback failed.
///
/// Mapped to a rejection of the current operation; never fatal to the
/// connection or to other sessions.
#[derive(Error, Debug, Clone)]
#[error("host callback failed: {0}")]
pub struct HostError(pub String);

impl HostError {
    /// Creates a host error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The host-side callbacks the gateway consumes.
///
/// All of these may suspend (database lookups, HTTP calls); a slow
/// callback stalls only the operation awaiting it.
#[async_trait]
pub trait ContentHost: Send + Sync {
    /// Resolves the connecting user from the connection handshake.
    /// `None` leaves the session anonymous (denied on every submit).
    async fn request_to_user(&self, handshake: &Value) -> Result<Option<User>, HostError>;

    /// Permission level for a user on a document. `None` denies; the
    /// gateway does not interpret present values beyond handing them to
    /// logic rules.
    async fn permission(&self, user: &User, document_id: &str) -> Result<Option<Value>, HostError>;

    /// The document's declared content type and required protocol
    /// version.
    async fn content_metadata(
        &self,
        document_id: &str,
        user: &User,
    ) -> Result<ContentMetadata, HostError>;

    /// Static authoring parameters for the document, made available to
    /// logic rules.
    async fn content_parameters(&self, document_id: &str, user: &User)
        -> Result<Value, HostError>;
}
