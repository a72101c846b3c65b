//! Host callbacks backed by plain maps.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use stategate_gateway::{ContentHost, HostError, User};
use stategate_registry::ContentMetadata;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Host whose answers are configured up front.
///
/// `request_to_user` reads `handshake["user"]`; permissions, metadata
/// and parameters come from maps. Call counters act as spies so tests
/// can assert that a denied operation never reached later callbacks.
#[derive(Default)]
pub struct StaticHost {
    permissions: RwLock<HashMap<(String, String), Value>>,
    metadata: RwLock<HashMap<String, ContentMetadata>>,
    params: RwLock<HashMap<String, Value>>,
    permission_calls: AtomicUsize,
    metadata_calls: AtomicUsize,
    params_calls: AtomicUsize,
}

impl StaticHost {
    /// Creates an empty host (everyone denied, no metadata).
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants a permission level to a user on a document.
    pub fn grant(&self, user_id: &str, document_id: &str, level: Value) {
        self.permissions
            .write()
            .insert((user_id.to_string(), document_id.to_string()), level);
    }

    /// Sets a document's content metadata.
    pub fn set_metadata(&self, document_id: &str, metadata: ContentMetadata) {
        self.metadata
            .write()
            .insert(document_id.to_string(), metadata);
    }

    /// Sets a document's authoring parameters.
    pub fn set_params(&self, document_id: &str, params: Value) {
        self.params.write().insert(document_id.to_string(), params);
    }

    /// Number of permission lookups observed.
    pub fn permission_calls(&self) -> usize {
        self.permission_calls.load(Ordering::SeqCst)
    }

    /// Number of metadata lookups observed.
    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    /// Number of parameter lookups observed.
    pub fn params_calls(&self) -> usize {
        self.params_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentHost for StaticHost {
    async fn request_to_user(&self, handshake: &Value) -> Result<Option<User>, HostError> {
        Ok(handshake
            .get("user")
            .and_then(Value::as_str)
            .map(User::new))
    }

    async fn permission(&self, user: &User, document_id: &str) -> Result<Option<Value>, HostError> {
        self.permission_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .permissions
            .read()
            .get(&(user.id.clone(), document_id.to_string()))
            .cloned())
    }

    async fn content_metadata(
        &self,
        document_id: &str,
        _user: &User,
    ) -> Result<ContentMetadata, HostError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.metadata
            .read()
            .get(document_id)
            .cloned()
            .ok_or_else(|| HostError::new(format!("no metadata for document '{document_id}'")))
    }

    async fn content_parameters(
        &self,
        document_id: &str,
        _user: &User,
    ) -> Result<Value, HostError> {
        self.params_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .params
            .read()
            .get(document_id)
            .cloned()
            .unwrap_or_else(|| json!({})))
    }
}
