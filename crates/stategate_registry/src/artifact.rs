//! Validation artifacts and the external store that serves them.

use crate::content_type::ContentType;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The validation artifacts a content type may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Structural schema for proposed operations.
    OpSchema,
    /// Structural schema for resulting snapshots.
    SnapshotSchema,
    /// Logic rules evaluated against a proposed operation.
    OpRules,
    /// Logic rules evaluated against a resulting snapshot.
    SnapshotRules,
}

impl ArtifactKind {
    /// Well-known file name of the artifact in the content type's
    /// metadata. Stable: hosts and content authors both rely on it.
    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::OpSchema => "opSchema.json",
            ArtifactKind::SnapshotSchema => "snapshotSchema.json",
            ArtifactKind::OpRules => "opLogicCheck.json",
            ArtifactKind::SnapshotRules => "snapshotLogicCheck.json",
        }
    }

    /// True for the schema artifacts.
    pub fn is_schema(&self) -> bool {
        matches!(self, ArtifactKind::OpSchema | ArtifactKind::SnapshotSchema)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::OpSchema => "opSchema",
            ArtifactKind::SnapshotSchema => "snapshotSchema",
            ArtifactKind::OpRules => "opLogicCheck",
            ArtifactKind::SnapshotRules => "snapshotLogicCheck",
        };
        f.write_str(name)
    }
}

/// Errors from the external artifact source.
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    /// The source could not be reached or the fetch failed. The caller
    /// treats this like a missing artifact (no constraint).
    #[error("artifact source unavailable: {0}")]
    Unavailable(String),

    /// The artifact exists but is not valid JSON. Distinct from
    /// "not found": this is a configuration error.
    #[error("artifact is not valid JSON: {0}")]
    Malformed(String),
}

/// External source of content-type validation artifacts.
///
/// `Ok(None)` means the content type does not declare the artifact.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Fetches the raw artifact definition for a content type.
    async fn fetch(
        &self,
        content_type: &ContentType,
        kind: ArtifactKind,
    ) -> Result<Option<Value>, ArtifactError>;
}

#[async_trait]
impl<T: ArtifactStore + ?Sized> ArtifactStore for std::sync::Arc<T> {
    async fn fetch(
        &self,
        content_type: &ContentType,
        kind: ArtifactKind,
    ) -> Result<Option<Value>, ArtifactError> {
        (**self).fetch(content_type, kind).await
    }
}
