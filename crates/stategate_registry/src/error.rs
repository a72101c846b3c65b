//! Error types for the registry.

use crate::artifact::ArtifactKind;
use thiserror::Error;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur while resolving content-type validators.
#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    /// A content-type identifier did not match `<name>-<major>.<minor>`.
    #[error("invalid content type identifier '{0}'")]
    BadContentType(String),

    /// An artifact definition exists but cannot be compiled or parsed.
    ///
    /// Fatal for the content type: the error repeats on every lookup
    /// until the definition is fixed.
    #[error("invalid {kind} for content type {content_type}: {reason}")]
    InvalidArtifact {
        /// The content type whose definition is broken.
        content_type: String,
        /// Which artifact is broken.
        kind: ArtifactKind,
        /// Compile or parse failure detail.
        reason: String,
    },
}
