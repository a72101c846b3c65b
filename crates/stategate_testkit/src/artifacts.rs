//! In-memory artifact store.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use stategate_registry::{ArtifactError, ArtifactKind, ArtifactStore, ContentType};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Artifact store backed by a map, with failure injection and a fetch
/// counter for memoization assertions.
#[derive(Default)]
pub struct MemoryArtifacts {
    artifacts: RwLock<HashMap<(ContentType, ArtifactKind), Value>>,
    unavailable: AtomicBool,
    fetches: AtomicUsize,
}

impl MemoryArtifacts {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an artifact for a content type.
    pub fn insert(&self, content_type: &ContentType, kind: ArtifactKind, value: Value) {
        self.artifacts
            .write()
            .insert((content_type.clone(), kind), value);
    }

    /// Makes every subsequent fetch fail as unavailable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of fetches observed.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifacts {
    async fn fetch(
        &self,
        content_type: &ContentType,
        kind: ArtifactKind,
    ) -> Result<Option<Value>, ArtifactError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ArtifactError::Unavailable("injected failure".into()));
        }
        Ok(self
            .artifacts
            .read()
            .get(&(content_type.clone(), kind))
            .cloned())
    }
}
