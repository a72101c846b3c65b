//! In-memory OT backend.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use stategate_gateway::{BackendError, DocKey, StateBackend};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory backend speaking a minimal json0-style op format.
///
/// An op is an array of components; each component carries a path `p`
/// (list of object keys) plus `oi` (insert/replace) and/or `od`
/// (delete). `apply` computes the candidate snapshot from a copy — the
/// stored document is only touched by `commit`, so a rejected
/// validation has no observable side effect.
#[derive(Default)]
pub struct MemoryBackend {
    docs: RwLock<HashMap<DocKey, Value>>,
    commits: AtomicUsize,
    fail_fetches: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document.
    pub fn insert_doc(&self, doc: DocKey, snapshot: Value) {
        self.docs.write().insert(doc, snapshot);
    }

    /// The currently committed snapshot, if any.
    pub fn snapshot(&self, doc: &DocKey) -> Option<Value> {
        self.docs.read().get(doc).cloned()
    }

    /// Number of commits observed.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Makes every subsequent fetch fail.
    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent delete fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

fn apply_component(snapshot: &mut Value, component: &Value) -> Result<(), BackendError> {
    let path = component
        .get("p")
        .and_then(Value::as_array)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| BackendError::Failure("op component needs a non-empty path".into()))?;

    let mut target = &mut *snapshot;
    for segment in &path[..path.len() - 1] {
        let key = segment
            .as_str()
            .ok_or_else(|| BackendError::Failure("path segments must be strings".into()))?;
        target = target
            .as_object_mut()
            .ok_or_else(|| BackendError::Failure("path traverses a non-object".into()))?
            .entry(key)
            .or_insert_with(|| json!({}));
    }

    let key = path[path.len() - 1]
        .as_str()
        .ok_or_else(|| BackendError::Failure("path segments must be strings".into()))?;
    let object = target
        .as_object_mut()
        .ok_or_else(|| BackendError::Failure("path traverses a non-object".into()))?;

    if let Some(insert) = component.get("oi") {
        object.insert(key.to_string(), insert.clone());
    } else if component.get("od").is_some() {
        object.remove(key);
    } else {
        return Err(BackendError::Failure(
            "op component needs 'oi' or 'od'".into(),
        ));
    }
    Ok(())
}

#[async_trait]
impl StateBackend for MemoryBackend {
    async fn apply(
        &self,
        doc: &DocKey,
        op: &Value,
        create: Option<&Value>,
    ) -> Result<Value, BackendError> {
        let mut snapshot = match self.docs.read().get(doc).cloned() {
            Some(snapshot) => snapshot,
            None => create.cloned().unwrap_or_else(|| json!({})),
        };

        let components = op
            .as_array()
            .ok_or_else(|| BackendError::Failure("op must be an array of components".into()))?;
        for component in components {
            apply_component(&mut snapshot, component)?;
        }
        Ok(snapshot)
    }

    async fn commit(
        &self,
        doc: &DocKey,
        _op: &Value,
        snapshot: &Value,
    ) -> Result<(), BackendError> {
        self.docs.write().insert(doc.clone(), snapshot.clone());
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch(&self, doc: &DocKey) -> Result<Option<Value>, BackendError> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(BackendError::Failure("injected fetch failure".into()));
        }
        Ok(self.docs.read().get(doc).cloned())
    }

    async fn delete(&self, doc: &DocKey) -> Result<(), BackendError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BackendError::Failure("injected delete failure".into()));
        }
        self.docs.write().remove(doc);
        Ok(())
    }
}
