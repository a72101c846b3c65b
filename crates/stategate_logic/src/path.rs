//! Path expressions into JSON subjects.

use crate::error::{RuleError, RuleResult};
use serde_json::Value;
use std::fmt;

/// A parsed JSON-path-style expression.
///
/// Supports the subset rule definitions actually use: `$` (the whole
/// subject), dot segments (`$.a.b`), numeric indices (`$.a[0]` or
/// `$.a.0`) and quoted keys (`$['a b']`, `$["a.b"]`).
///
/// Resolution returns `None` when the path does not reach a value. That
/// sentinel is distinct from `Value::Null`: a document carrying an
/// explicit `null` resolves to `Some(&Value::Null)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathExpr {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Key(String),
    Index(usize),
}

impl PathExpr {
    /// Parses a path expression.
    pub fn parse(raw: &str) -> RuleResult<Self> {
        let invalid = |reason: &'static str| RuleError::InvalidPath {
            path: raw.to_string(),
            reason,
        };

        let mut rest = raw
            .strip_prefix('$')
            .ok_or_else(|| invalid("must start with '$'"))?;

        let mut segments = Vec::new();
        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix('.') {
                let end = tail
                    .find(['.', '['])
                    .unwrap_or(tail.len());
                let key = &tail[..end];
                if key.is_empty() {
                    return Err(invalid("empty segment"));
                }
                segments.push(Segment::Key(key.to_string()));
                rest = &tail[end..];
            } else if let Some(tail) = rest.strip_prefix('[') {
                let (segment, after) = Self::parse_bracket(tail, &invalid)?;
                segments.push(segment);
                rest = after;
            } else {
                return Err(invalid("expected '.' or '['"));
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    fn parse_bracket<'a>(
        tail: &'a str,
        invalid: &impl Fn(&'static str) -> RuleError,
    ) -> RuleResult<(Segment, &'a str)> {
        if let Some(quote) = tail.chars().next().filter(|c| *c == '\'' || *c == '"') {
            let body = &tail[1..];
            let end = body
                .find(quote)
                .ok_or_else(|| invalid("unterminated quoted key"))?;
            let after = body[end + 1..]
                .strip_prefix(']')
                .ok_or_else(|| invalid("expected ']' after quoted key"))?;
            Ok((Segment::Key(body[..end].to_string()), after))
        } else {
            let end = tail
                .find(']')
                .ok_or_else(|| invalid("unterminated index"))?;
            let index = tail[..end]
                .parse::<usize>()
                .map_err(|_| invalid("index must be an unsigned integer"))?;
            Ok((Segment::Index(index), &tail[end + 1..]))
        }
    }

    /// Resolves the path against a subject.
    ///
    /// Returns `None` (unresolved) when any segment is missing or the
    /// intermediate value has the wrong shape.
    pub fn resolve<'v>(&self, subject: &'v Value) -> Option<&'v Value> {
        let mut current = subject;
        for segment in &self.segments {
            current = match segment {
                Segment::Key(key) => match current {
                    Value::Object(map) => map.get(key)?,
                    // Dot notation over an array works when the segment
                    // is numeric, matching the source data model.
                    Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
                    _ => return None,
                },
                Segment::Index(index) => match current {
                    Value::Array(items) => items.get(*index)?,
                    _ => return None,
                },
            };
        }
        Some(current)
    }

    /// Returns the raw path text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
