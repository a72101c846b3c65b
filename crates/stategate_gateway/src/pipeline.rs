//! The in-flight operation model and rule-subject construction.

use crate::session::{ResolvedContext, User};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Lifecycle of one in-flight operation.
///
/// A rejection at any checked stage moves directly to `Rejected` and
/// skips all later stages; `Committed` triggers broadcast (the
/// backend's job). Both are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpPhase {
    /// Submission received, nothing checked yet.
    Received,
    /// Permission, content metadata and protocol version verified.
    Authorized,
    /// The operation's wire shape passed the op schema (or none is
    /// declared).
    OpSchemaChecked,
    /// Op logic rules passed (or none are declared).
    OpLogicChecked,
    /// The backend's candidate snapshot has been accepted for
    /// snapshot-level validation.
    AppliedTentatively,
    /// The candidate snapshot passed the snapshot schema.
    SnapshotSchemaChecked,
    /// The candidate snapshot passed the snapshot logic rules.
    SnapshotLogicChecked,
    /// The backend finalized the change.
    Committed,
    /// Rejected at some checked stage.
    Rejected,
}

impl OpPhase {
    /// True once the operation can make no further progress.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OpPhase::Committed | OpPhase::Rejected)
    }
}

/// A proposed change to a document, as submitted by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpSubmission {
    /// The operation, in the OT backend's vocabulary.
    pub op: Value,
    /// Initial document payload when the operation creates the
    /// document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create: Option<Value>,
}

impl OpSubmission {
    /// A plain edit.
    pub fn op(op: Value) -> Self {
        Self { op, create: None }
    }

    /// An edit that also creates the document.
    pub fn with_create(op: Value, create: Value) -> Self {
        Self {
            op,
            create: Some(create),
        }
    }

    /// The wire-shaped message — what op schemas validate.
    pub fn message(&self) -> Value {
        let mut message = Map::new();
        message.insert("op".to_string(), self.op.clone());
        if let Some(create) = &self.create {
            message.insert("create".to_string(), create.clone());
        }
        Value::Object(message)
    }
}

/// A committed submission.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    /// The snapshot the backend finalized.
    pub snapshot: Value,
}

/// Subject for op logic rules:
/// `{op, create, params, context: {user, permission}, snapshot}`,
/// where `snapshot` is the backend's candidate.
pub(crate) fn op_subject(
    submission: &OpSubmission,
    resolved: &ResolvedContext,
    user: &User,
    candidate: &Value,
) -> Value {
    json!({
        "op": submission.op,
        "create": submission.create.clone().unwrap_or(Value::Null),
        "params": resolved.params,
        "context": context_value(resolved, user),
        "snapshot": candidate,
    })
}

/// Subject for snapshot logic rules:
/// `{snapshot, params, context: {user, permission}}`.
pub(crate) fn snapshot_subject(
    snapshot: &Value,
    resolved: &ResolvedContext,
    user: &User,
) -> Value {
    json!({
        "snapshot": snapshot,
        "params": resolved.params,
        "context": context_value(resolved, user),
    })
}

fn context_value(resolved: &ResolvedContext, user: &User) -> Value {
    json!({
        "user": { "id": user.id },
        "permission": resolved.permission,
    })
}
