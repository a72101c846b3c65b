//! Error types for the gateway pipeline.

use crate::backend::BackendError;
use crate::host::HostError;
use stategate_registry::{ArtifactKind, RegistryError};
use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors that reject an operation (or surface a deployment problem)
/// at some pipeline stage.
///
/// Every variant is recovered locally: a rejection answers the specific
/// submission, never tears down the connection or other sessions.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The acting user has no permission for the document.
    #[error("not permitted")]
    NotPermitted,

    /// The content type requires a sync protocol version this gateway
    /// does not implement. A deployment or content-authoring problem,
    /// not a transient one.
    #[error("unsupported sync protocol version: content requires {required}, gateway supports {supported}")]
    VersionMismatch {
        /// Version the content type declares it needs.
        required: u16,
        /// The single version this gateway implements.
        supported: u16,
    },

    /// The operation or snapshot violated a structural schema. The
    /// reason names the failing artifact; the validator's full trace is
    /// logged, not sent to clients.
    #[error("rejected by {artifact}")]
    SchemaViolation {
        /// Which schema artifact failed.
        artifact: ArtifactKind,
    },

    /// The operation or snapshot failed business-rule validation. The
    /// failing sub-rule is logged only.
    #[error("failed business-rule validation ({artifact})")]
    RuleViolation {
        /// Which rule artifact failed.
        artifact: ArtifactKind,
    },

    /// A content type's validation artifacts are broken. Fatal for that
    /// content type: everything against it is rejected until fixed.
    #[error("content type configuration error: {0}")]
    Configuration(#[from] RegistryError),

    /// An external host callback failed.
    #[error(transparent)]
    Host(#[from] HostError),

    /// The OT backend failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

impl GatewayError {
    /// True for ordinary per-operation rejections the client can act
    /// on (fix the operation, gain permission).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            GatewayError::NotPermitted
                | GatewayError::VersionMismatch { .. }
                | GatewayError::SchemaViolation { .. }
                | GatewayError::RuleViolation { .. }
        )
    }

    /// True for configuration problems that repeat until an operator
    /// fixes the content type's definitions.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GatewayError::Configuration(_) | GatewayError::VersionMismatch { .. }
        )
    }
}
