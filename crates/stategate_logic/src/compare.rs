//! Loose, coercing comparisons over JSON values.
//!
//! Rule definitions come from a data model with JavaScript-style loose
//! equality, and deployed rule sets depend on those semantics. The
//! coercion table is pinned by the tests below; do not tighten it.
//!
//! - numbers compare numerically
//! - a numeric string compares equal to the number it parses to
//!   (whitespace-only strings do not coerce)
//! - booleans coerce to 0/1 against numbers and numeric strings
//! - `null` is loose-equal to `null` and to an unresolved path
//! - arrays are loose-equal iff same length with pairwise loose-equal
//!   elements; an array is never loose-equal to a non-array
//! - objects are never loose-equal (reference semantics in the source
//!   data model)

use serde_json::Value;
use std::cmp::Ordering;

/// Loose equality between two resolved values, where `None` is the
/// unresolved-path sentinel.
pub fn loose_eq_opt(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (None, Some(v)) | (Some(v), None) => v.is_null(),
        (Some(a), Some(b)) => loose_eq(a, b),
    }
}

/// Loose equality between two JSON values.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| loose_eq(x, y))
        }
        (Value::Array(_), _) | (_, Value::Array(_)) => false,
        (Value::Object(_), _) | (_, Value::Object(_)) => false,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        _ => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// Ordering used by `$gt`/`$gte`/`$lt`/`$lte`.
///
/// Numeric when both sides coerce to numbers, lexicographic for two
/// strings, otherwise unordered (every ordering comparison is false,
/// including against an unresolved path).
pub fn loose_cmp(a: Option<&Value>, b: Option<&Value>) -> Option<Ordering> {
    let (a, b) = (a?, b?);
    if let (Value::String(x), Value::String(y)) = (a, b) {
        return Some(x.cmp(y));
    }
    as_number(a)?.partial_cmp(&as_number(b)?)
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}
