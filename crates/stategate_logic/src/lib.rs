//! # StateGate Logic
//!
//! Declarative logic rules ("LogicChecker") evaluated against JSON
//! subjects.
//!
//! A rule set is an ordered list of rules evaluated as a conjunction.
//! Each rule is either a boolean composition (`$and`, `$or`, `$not`,
//! `$nor`), an existence check (`$defined`), or a path predicate that
//! compares the value at a JSON-path-style expression against a literal
//! or against another path (`$query`).
//!
//! ```
//! use serde_json::json;
//! use stategate_logic::RuleSet;
//!
//! let rules = RuleSet::parse(&json!([
//!     { "$.score": { "$gte": 0 } },
//!     { "$defined": "$.owner" }
//! ])).unwrap();
//!
//! assert!(rules.evaluate(&json!({ "score": 3, "owner": "abc" })));
//! assert!(!rules.evaluate(&json!({ "score": -1, "owner": "abc" })));
//! ```
//!
//! # Comparison semantics
//!
//! Rule definitions originate from a data model with JavaScript-style
//! loose equality, and evaluation preserves those semantics rather than
//! tightening them: numbers and numeric strings compare equal across
//! type, booleans coerce to 0/1, an unresolved path is loose-equal to
//! `null`, and `$in` against an unresolved path is vacuously true. See
//! [`compare`] for the full table.
//!
//! Malformed rule definitions are configuration errors: parsing fails
//! loudly with a [`RuleError`] instead of evaluating as if the rule
//! passed.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod compare;
mod error;
mod path;
mod rule;

pub use error::{RuleError, RuleResult};
pub use path::PathExpr;
pub use rule::{CompareOp, Operand, Rule, RuleSet};
