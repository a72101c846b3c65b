//! Error types for rule definitions.

use serde_json::Value;
use thiserror::Error;

/// Result type for rule parsing.
pub type RuleResult<T> = Result<T, RuleError>;

/// Errors raised by malformed rule definitions.
///
/// These are configuration errors, not per-subject rejections: a rule
/// set that fails to parse must never be evaluated as if it passed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// A rule set definition was not a JSON array.
    #[error("rule set must be a JSON array, got {0}")]
    SetNotArray(&'static str),

    /// A rule definition was not a JSON object.
    #[error("rule must be a JSON object, got {0}")]
    RuleNotObject(&'static str),

    /// A rule key did not start with the path sigil.
    #[error("rule key '{0}' must start with '$'")]
    KeyWithoutSigil(String),

    /// A `$`-prefixed key that is neither a known operator nor a path.
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    /// An operator received an argument of the wrong shape.
    #[error("operator {op} requires {expected}")]
    BadArgument {
        /// The offending operator.
        op: &'static str,
        /// What the operator expects.
        expected: &'static str,
    },

    /// A path expression failed to parse.
    #[error("invalid path expression '{path}': {reason}")]
    InvalidPath {
        /// The raw path text.
        path: String,
        /// Why it failed to parse.
        reason: &'static str,
    },
}

/// Human-readable JSON type name, for error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
