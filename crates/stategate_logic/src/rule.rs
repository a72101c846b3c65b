//! Rule parsing and evaluation.

use crate::compare::{loose_cmp, loose_eq_opt};
use crate::error::{json_type_name, RuleError, RuleResult};
use crate::path::PathExpr;
use serde_json::Value;
use std::cmp::Ordering;

/// Comparison operators available in predicate position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Loose equality.
    Eq,
    /// Loose inequality.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
}

/// Right-hand side of a comparison: a literal, or another path into the
/// same subject (`{"$query": "$.other.path"}`).
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A literal JSON value.
    Literal(Value),
    /// The value at another path of the subject.
    Query(PathExpr),
}

/// A single parsed logic rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// All sub-rules hold; vacuously true for an empty list.
    And(Vec<Rule>),
    /// Any sub-rule holds; vacuously false for an empty list.
    Or(Vec<Rule>),
    /// The sub-rule does not hold.
    Not(Box<Rule>),
    /// Neither of exactly two sub-rules holds.
    Nor(Box<Rule>, Box<Rule>),
    /// The path resolves to a value (an explicit `null` counts).
    Defined(PathExpr),
    /// Compare the value at a path against an operand.
    Compare {
        /// Path into the subject.
        path: PathExpr,
        /// Comparison operator.
        op: CompareOp,
        /// Right-hand side.
        operand: Operand,
    },
    /// Membership test (`$in` / `$nin`) of a path's value against a
    /// literal argument.
    Membership {
        /// Path into the subject.
        path: PathExpr,
        /// The raw argument. Non-array arguments fail closed at
        /// evaluation time rather than erroring, preserving the
        /// source semantics.
        argument: Value,
        /// True for `$nin`.
        negated: bool,
    },
}

impl Rule {
    /// Parses one rule from its JSON definition.
    ///
    /// A rule object with several keys is the conjunction of its
    /// entries.
    pub fn parse(value: &Value) -> RuleResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| RuleError::RuleNotObject(json_type_name(value)))?;

        let mut parts = Vec::with_capacity(map.len());
        for (key, argument) in map {
            parts.push(Self::parse_entry(key, argument)?);
        }
        if parts.len() == 1 {
            Ok(parts.remove(0))
        } else {
            Ok(Rule::And(parts))
        }
    }

    fn parse_entry(key: &str, argument: &Value) -> RuleResult<Self> {
        match key {
            "$and" => Ok(Rule::And(Self::parse_list("$and", argument)?)),
            "$or" => Ok(Rule::Or(Self::parse_list("$or", argument)?)),
            "$not" => Ok(Rule::Not(Box::new(Self::parse(argument)?))),
            "$nor" => {
                let mut rules = Self::parse_list("$nor", argument)?;
                if rules.len() != 2 {
                    return Err(RuleError::BadArgument {
                        op: "$nor",
                        expected: "an array of exactly two rules",
                    });
                }
                let second = Box::new(rules.remove(1));
                let first = Box::new(rules.remove(0));
                Ok(Rule::Nor(first, second))
            }
            "$defined" => {
                let path = argument.as_str().ok_or(RuleError::BadArgument {
                    op: "$defined",
                    expected: "a path string",
                })?;
                Ok(Rule::Defined(PathExpr::parse(path)?))
            }
            _ if Self::is_path_key(key) => {
                let path = PathExpr::parse(key)?;
                Self::parse_predicate(path, argument)
            }
            _ if key.starts_with('$') => Err(RuleError::UnknownOperator(key.to_string())),
            _ => Err(RuleError::KeyWithoutSigil(key.to_string())),
        }
    }

    fn is_path_key(key: &str) -> bool {
        key == "$" || key.starts_with("$.") || key.starts_with("$[")
    }

    fn parse_list(op: &'static str, argument: &Value) -> RuleResult<Vec<Rule>> {
        let items = argument.as_array().ok_or(RuleError::BadArgument {
            op,
            expected: "an array of rules",
        })?;
        items.iter().map(Self::parse).collect()
    }

    /// Parses the right-hand side of a path predicate. A nested object
    /// whose keys are all operators is a conjunction of operator
    /// predicates; anything else is a bare-literal equality.
    fn parse_predicate(path: PathExpr, argument: &Value) -> RuleResult<Self> {
        let Some(map) = argument.as_object() else {
            return Ok(Rule::Compare {
                path,
                op: CompareOp::Eq,
                operand: Operand::Literal(argument.clone()),
            });
        };

        if !map.keys().any(|k| k.starts_with('$')) {
            // Object literal: compared by loose equality (which never
            // matches objects, matching the source data model).
            return Ok(Rule::Compare {
                path,
                op: CompareOp::Eq,
                operand: Operand::Literal(argument.clone()),
            });
        }

        let mut parts = Vec::with_capacity(map.len());
        for (op_key, op_arg) in map {
            let part = match op_key.as_str() {
                "$eq" => Self::compare(&path, CompareOp::Eq, op_arg)?,
                "$ne" => Self::compare(&path, CompareOp::Ne, op_arg)?,
                "$gt" => Self::compare(&path, CompareOp::Gt, op_arg)?,
                "$gte" => Self::compare(&path, CompareOp::Gte, op_arg)?,
                "$lt" => Self::compare(&path, CompareOp::Lt, op_arg)?,
                "$lte" => Self::compare(&path, CompareOp::Lte, op_arg)?,
                "$in" => Rule::Membership {
                    path: path.clone(),
                    argument: op_arg.clone(),
                    negated: false,
                },
                "$nin" => Rule::Membership {
                    path: path.clone(),
                    argument: op_arg.clone(),
                    negated: true,
                },
                other => return Err(RuleError::UnknownOperator(other.to_string())),
            };
            parts.push(part);
        }
        if parts.len() == 1 {
            Ok(parts.remove(0))
        } else {
            Ok(Rule::And(parts))
        }
    }

    fn compare(path: &PathExpr, op: CompareOp, argument: &Value) -> RuleResult<Self> {
        Ok(Rule::Compare {
            path: path.clone(),
            op,
            operand: Self::parse_operand(argument)?,
        })
    }

    fn parse_operand(argument: &Value) -> RuleResult<Operand> {
        if let Some(map) = argument.as_object() {
            if map.contains_key("$query") {
                if map.len() != 1 {
                    return Err(RuleError::BadArgument {
                        op: "$query",
                        expected: "a lone path string",
                    });
                }
                let path = map
                    .get("$query")
                    .and_then(Value::as_str)
                    .ok_or(RuleError::BadArgument {
                        op: "$query",
                        expected: "a lone path string",
                    })?;
                return Ok(Operand::Query(PathExpr::parse(path)?));
            }
        }
        Ok(Operand::Literal(argument.clone()))
    }

    /// Evaluates the rule against a subject.
    pub fn evaluate(&self, subject: &Value) -> bool {
        match self {
            Rule::And(rules) => rules.iter().all(|r| r.evaluate(subject)),
            Rule::Or(rules) => rules.iter().any(|r| r.evaluate(subject)),
            Rule::Not(rule) => !rule.evaluate(subject),
            Rule::Nor(a, b) => !a.evaluate(subject) && !b.evaluate(subject),
            Rule::Defined(path) => path.resolve(subject).is_some(),
            Rule::Compare { path, op, operand } => {
                let lhs = path.resolve(subject);
                let rhs = match operand {
                    Operand::Literal(value) => Some(value),
                    Operand::Query(path) => path.resolve(subject),
                };
                match op {
                    CompareOp::Eq => loose_eq_opt(lhs, rhs),
                    CompareOp::Ne => !loose_eq_opt(lhs, rhs),
                    CompareOp::Gt => matches!(loose_cmp(lhs, rhs), Some(Ordering::Greater)),
                    CompareOp::Gte => matches!(
                        loose_cmp(lhs, rhs),
                        Some(Ordering::Greater | Ordering::Equal)
                    ),
                    CompareOp::Lt => matches!(loose_cmp(lhs, rhs), Some(Ordering::Less)),
                    CompareOp::Lte => {
                        matches!(loose_cmp(lhs, rhs), Some(Ordering::Less | Ordering::Equal))
                    }
                }
            }
            Rule::Membership {
                path,
                argument,
                negated,
            } => {
                let resolved = path.resolve(subject);
                if *negated {
                    // Non-array arguments fail closed.
                    let Value::Array(items) = argument else {
                        return false;
                    };
                    !items.iter().any(|item| loose_eq_opt(Some(item), resolved))
                } else {
                    // An unresolved path is vacuously "in": optional-field
                    // rules rely on this.
                    if resolved.is_none() {
                        return true;
                    }
                    let Value::Array(items) = argument else {
                        return false;
                    };
                    items.iter().any(|item| loose_eq_opt(Some(item), resolved))
                }
            }
        }
    }
}

/// An ordered rule list evaluated as a conjunction.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Parses a rule set from a JSON array of rule objects.
    pub fn parse(value: &Value) -> RuleResult<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| RuleError::SetNotArray(json_type_name(value)))?;
        let rules = items.iter().map(Rule::parse).collect::<RuleResult<_>>()?;
        Ok(Self { rules })
    }

    /// Builds a rule set from already-parsed rules.
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Evaluates every rule in order against the subject.
    ///
    /// Logs the first failing rule so rejections can be audited without
    /// leaking rule internals to clients.
    pub fn evaluate(&self, subject: &Value) -> bool {
        for (index, rule) in self.rules.iter().enumerate() {
            if !rule.evaluate(subject) {
                tracing::debug!(
                    target: "stategate::logic",
                    index,
                    rule = ?rule,
                    "rule set rejected subject"
                );
                return false;
            }
        }
        true
    }

    /// Number of top-level rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if the set contains no rules (and accepts everything).
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn rules(definition: Value) -> RuleSet {
        RuleSet::parse(&definition).unwrap()
    }

    #[test]
    fn bare_literal_is_equality() {
        let set = rules(json!([{ "$.kind": "quiz" }]));
        assert!(set.evaluate(&json!({ "kind": "quiz" })));
        assert!(!set.evaluate(&json!({ "kind": "poll" })));
        assert!(!set.evaluate(&json!({})));
    }

    #[test]
    fn top_level_list_is_a_conjunction() {
        let set = rules(json!([
            { "$.a": 1 },
            { "$.b": 2 }
        ]));
        assert!(set.evaluate(&json!({ "a": 1, "b": 2 })));
        assert!(!set.evaluate(&json!({ "a": 1, "b": 3 })));
    }

    #[test]
    fn multi_key_rule_object_is_a_conjunction() {
        let set = rules(json!([{ "$.a": 1, "$.b": 2 }]));
        assert!(set.evaluate(&json!({ "a": 1, "b": 2 })));
        assert!(!set.evaluate(&json!({ "a": 1 })));
    }

    #[test]
    fn comparison_operators() {
        let set = rules(json!([{ "$.score": { "$gte": 0, "$lt": 100 } }]));
        assert!(set.evaluate(&json!({ "score": 0 })));
        assert!(set.evaluate(&json!({ "score": 99 })));
        assert!(!set.evaluate(&json!({ "score": 100 })));
        assert!(!set.evaluate(&json!({ "score": -1 })));
        // Unresolved paths never satisfy an ordering comparison.
        assert!(!set.evaluate(&json!({})));
    }

    #[test]
    fn ne_operator() {
        let set = rules(json!([{ "$.state": { "$ne": "locked" } }]));
        assert!(set.evaluate(&json!({ "state": "open" })));
        assert!(!set.evaluate(&json!({ "state": "locked" })));
        // Unresolved is loose-equal to null only; $ne against a string
        // holds for a missing path.
        assert!(set.evaluate(&json!({})));
    }

    #[test]
    fn query_compares_two_paths() {
        let set = rules(json!([
            { "$.attempt": { "$lte": { "$query": "$.limit" } } }
        ]));
        assert!(set.evaluate(&json!({ "attempt": 2, "limit": 3 })));
        assert!(!set.evaluate(&json!({ "attempt": 4, "limit": 3 })));
    }

    #[test]
    fn query_equality_against_context() {
        let set = rules(json!([
            { "$.snapshot.owner": { "$eq": { "$query": "$.context.user.id" } } }
        ]));
        let subject = json!({
            "snapshot": { "owner": "u1" },
            "context": { "user": { "id": "u1" } }
        });
        assert!(set.evaluate(&subject));
        let other = json!({
            "snapshot": { "owner": "u1" },
            "context": { "user": { "id": "u2" } }
        });
        assert!(!set.evaluate(&other));
    }

    #[test]
    fn in_unresolved_path_is_vacuously_true() {
        let set = rules(json!([{ "$.missing": { "$in": ["a", "b"] } }]));
        assert!(set.evaluate(&json!({})));
        // Even against an empty argument array.
        let empty = rules(json!([{ "$.missing": { "$in": [] } }]));
        assert!(empty.evaluate(&json!({})));
    }

    #[test]
    fn in_resolved_path_checks_membership() {
        let set = rules(json!([{ "$.mode": { "$in": ["solo", "team"] } }]));
        assert!(set.evaluate(&json!({ "mode": "solo" })));
        assert!(!set.evaluate(&json!({ "mode": "ffa" })));
        // Loose membership: "1" is in [1, 2].
        let loose = rules(json!([{ "$.n": { "$in": [1, 2] } }]));
        assert!(loose.evaluate(&json!({ "n": "1" })));
    }

    #[test]
    fn in_non_array_argument_fails_closed() {
        let set = rules(json!([{ "$.mode": { "$in": "solo" } }]));
        assert!(!set.evaluate(&json!({ "mode": "solo" })));
    }

    #[test]
    fn nin_unresolved_path_is_true() {
        let set = rules(json!([{ "$.missing": { "$nin": ["a", "b"] } }]));
        assert!(set.evaluate(&json!({})));
    }

    #[test]
    fn nin_resolved_path() {
        let set = rules(json!([{ "$.mode": { "$nin": ["banned"] } }]));
        assert!(set.evaluate(&json!({ "mode": "solo" })));
        assert!(!set.evaluate(&json!({ "mode": "banned" })));
    }

    #[test]
    fn nin_non_array_argument_fails_closed() {
        let set = rules(json!([{ "$.mode": { "$nin": "banned" } }]));
        assert!(!set.evaluate(&json!({ "mode": "solo" })));
    }

    #[test]
    fn and_over_empty_list_is_true() {
        let set = rules(json!([{ "$and": [] }]));
        assert!(set.evaluate(&json!({})));
    }

    #[test]
    fn or_over_empty_list_is_false() {
        let set = rules(json!([{ "$or": [] }]));
        assert!(!set.evaluate(&json!({})));
    }

    #[test]
    fn boolean_composition() {
        let set = rules(json!([
            { "$or": [ { "$.a": 1 }, { "$.b": 1 } ] }
        ]));
        assert!(set.evaluate(&json!({ "a": 1 })));
        assert!(set.evaluate(&json!({ "b": 1 })));
        assert!(!set.evaluate(&json!({ "c": 1 })));

        let negated = rules(json!([{ "$not": { "$.a": 1 } }]));
        assert!(negated.evaluate(&json!({ "a": 2 })));
        assert!(!negated.evaluate(&json!({ "a": 1 })));
    }

    #[test]
    fn nor_is_boolean_nor_of_two() {
        let set = rules(json!([
            { "$nor": [ { "$.a": 1 }, { "$.b": 1 } ] }
        ]));
        assert!(set.evaluate(&json!({})));
        assert!(!set.evaluate(&json!({ "a": 1 })));
        assert!(!set.evaluate(&json!({ "b": 1 })));
        assert!(!set.evaluate(&json!({ "a": 1, "b": 1 })));
    }

    #[test]
    fn defined_distinguishes_null_from_missing() {
        let set = rules(json!([{ "$defined": "$.field" }]));
        assert!(set.evaluate(&json!({ "field": null })));
        assert!(set.evaluate(&json!({ "field": 0 })));
        assert!(!set.evaluate(&json!({})));
    }

    #[test]
    fn malformed_rules_fail_loudly() {
        // Non-$ key.
        assert!(matches!(
            RuleSet::parse(&json!([{ "kind": "quiz" }])),
            Err(RuleError::KeyWithoutSigil(_))
        ));
        // Unknown operator.
        assert!(matches!(
            RuleSet::parse(&json!([{ "$exists": "$.a" }])),
            Err(RuleError::UnknownOperator(_))
        ));
        assert!(matches!(
            RuleSet::parse(&json!([{ "$.a": { "$matches": "x" } }])),
            Err(RuleError::UnknownOperator(_))
        ));
        // $and over a non-array.
        assert!(matches!(
            RuleSet::parse(&json!([{ "$and": { "$.a": 1 } }])),
            Err(RuleError::BadArgument { op: "$and", .. })
        ));
        // $nor arity.
        assert!(matches!(
            RuleSet::parse(&json!([{ "$nor": [ { "$.a": 1 } ] }])),
            Err(RuleError::BadArgument { op: "$nor", .. })
        ));
        // $defined needs a path string.
        assert!(matches!(
            RuleSet::parse(&json!([{ "$defined": 5 }])),
            Err(RuleError::BadArgument { op: "$defined", .. })
        ));
        // $query must be a lone string.
        assert!(matches!(
            RuleSet::parse(&json!([{ "$.a": { "$eq": { "$query": 5 } } }])),
            Err(RuleError::BadArgument { op: "$query", .. })
        ));
        // A rule set is an array, a rule is an object.
        assert!(matches!(
            RuleSet::parse(&json!({ "$.a": 1 })),
            Err(RuleError::SetNotArray(_))
        ));
        assert!(matches!(
            RuleSet::parse(&json!(["$.a"])),
            Err(RuleError::RuleNotObject(_))
        ));
    }

    #[test]
    fn object_literal_predicate_never_matches() {
        let set = rules(json!([{ "$.a": { "b": 1 } }]));
        assert!(!set.evaluate(&json!({ "a": { "b": 1 } })));
    }

    proptest! {
        #[test]
        fn evaluation_is_deterministic(
            score in any::<i64>(),
            mode in "[a-z]{1,8}",
            flag in any::<bool>(),
        ) {
            let set = rules(json!([
                { "$.score": { "$gte": 0 } },
                { "$.mode": { "$in": ["solo", "team"] } },
                { "$or": [ { "$.flag": true }, { "$.score": { "$lt": 10 } } ] }
            ]));
            let subject = json!({ "score": score, "mode": mode, "flag": flag });
            let first = set.evaluate(&subject);
            for _ in 0..4 {
                prop_assert_eq!(set.evaluate(&subject), first);
            }
        }
    }
}
