//! Predicate expression trees and three-valued evaluation.
//!
//! A rule's condition is a structured tree of AND/OR/NOT, comparisons,
//! presence checks, and references to other rules' predicates.  Evaluation
//! against a request's facts uses Kleene three-valued logic: a referenced
//! attribute that is absent produces `Undefined`, which counts as a
//! non-match and is surfaced as a warning, never as an error.
//!
//! Example in TOML:
//! ```toml
//! [rules.predicate]
//! type = "all"
//!
//! [[rules.predicate.preds]]
//! type = "compare"
//! field = "resource.kind"
//! op = "eq"
//! value = "storage_bucket"
//!
//! [[rules.predicate.preds]]
//! type = "absent"
//! field = "encryption"
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Kleene three-valued truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tri {
    True,
    False,
    Undefined,
}

impl Tri {
    pub fn and(self, other: Tri) -> Tri {
        match (self, other) {
            (Tri::False, _) | (_, Tri::False) => Tri::False,
            (Tri::True, Tri::True) => Tri::True,
            _ => Tri::Undefined,
        }
    }

    pub fn or(self, other: Tri) -> Tri {
        match (self, other) {
            (Tri::True, _) | (_, Tri::True) => Tri::True,
            (Tri::False, Tri::False) => Tri::False,
            _ => Tri::Undefined,
        }
    }

    pub fn not(self) -> Tri {
        match self {
            Tri::True => Tri::False,
            Tri::False => Tri::True,
            Tri::Undefined => Tri::Undefined,
        }
    }
}

/// Comparison operators for the `compare` predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A node in a rule's predicate expression tree.
///
/// `Ref` nodes reference another rule's predicate by id; the resulting
/// dependency graph must be acyclic and depth-bounded, which is enforced
/// at policy load time (see `PolicySet::validate`), never at evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Predicate {
    /// True when every child is true (empty list is true).
    All { preds: Vec<Predicate> },

    /// True when at least one child is true (empty list is false).
    AnyOf { preds: Vec<Predicate> },

    /// Kleene negation of the child.
    Not { pred: Box<Predicate> },

    /// Compare the field at the dot-notation path against a literal.
    Compare {
        field: String,
        op: CmpOp,
        value: serde_json::Value,
    },

    /// True when the field is present and non-null.
    Present { field: String },

    /// True when the field is missing or JSON null.
    Absent { field: String },

    /// Evaluate the predicate of another rule in the same policy set.
    Ref { rule_id: String },
}

impl Predicate {
    /// Evaluate this predicate against `facts`.
    ///
    /// `refs` maps rule ids to their predicates for `Ref` resolution; the
    /// load-time acyclicity check guarantees this recursion terminates.
    /// Undefined field references push one warning each, attributed to
    /// `rule_id`.
    pub fn eval(
        &self,
        facts: &serde_json::Value,
        refs: &HashMap<&str, &Predicate>,
        rule_id: &str,
        warnings: &mut Vec<String>,
    ) -> Tri {
        match self {
            Predicate::All { preds } => preds
                .iter()
                .fold(Tri::True, |acc, p| acc.and(p.eval(facts, refs, rule_id, warnings))),

            Predicate::AnyOf { preds } => preds
                .iter()
                .fold(Tri::False, |acc, p| acc.or(p.eval(facts, refs, rule_id, warnings))),

            Predicate::Not { pred } => pred.eval(facts, refs, rule_id, warnings).not(),

            Predicate::Compare { field, op, value } => {
                match resolve_path(facts, field) {
                    Some(actual) => compare(actual, *op, value).unwrap_or_else(|| {
                        warnings.push(format!(
                            "rule '{}': field '{}' is not comparable with the rule's literal",
                            rule_id, field
                        ));
                        Tri::Undefined
                    }),
                    None => {
                        warnings.push(format!(
                            "rule '{}': field '{}' is absent from the request",
                            rule_id, field
                        ));
                        Tri::Undefined
                    }
                }
            }

            // Presence checks are total: absence is an answer, not a gap.
            Predicate::Present { field } => match resolve_path(facts, field) {
                Some(_) => Tri::True,
                None => Tri::False,
            },

            Predicate::Absent { field } => match resolve_path(facts, field) {
                Some(_) => Tri::False,
                None => Tri::True,
            },

            Predicate::Ref { rule_id: target } => match refs.get(target.as_str()) {
                Some(pred) => pred.eval(facts, refs, target, warnings),
                None => {
                    // Unreachable after load-time validation; treated as a
                    // non-match rather than a panic.
                    warnings.push(format!(
                        "rule '{}': reference to unknown rule '{}'",
                        rule_id, target
                    ));
                    Tri::Undefined
                }
            },
        }
    }

    /// Structural nesting depth of this tree, not counting `Ref` expansion.
    ///
    /// Load-time validation combines this with the `Ref` graph to bound the
    /// effective depth.
    pub fn depth(&self) -> usize {
        match self {
            Predicate::All { preds } | Predicate::AnyOf { preds } => {
                1 + preds.iter().map(Predicate::depth).max().unwrap_or(0)
            }
            Predicate::Not { pred } => 1 + pred.depth(),
            Predicate::Compare { .. }
            | Predicate::Present { .. }
            | Predicate::Absent { .. }
            | Predicate::Ref { .. } => 1,
        }
    }

    /// Rule ids this predicate references, recursively.
    pub fn referenced_rules(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        out
    }

    fn collect_refs<'p>(&'p self, out: &mut Vec<&'p str>) {
        match self {
            Predicate::All { preds } | Predicate::AnyOf { preds } => {
                for p in preds {
                    p.collect_refs(out);
                }
            }
            Predicate::Not { pred } => pred.collect_refs(out),
            Predicate::Ref { rule_id } => out.push(rule_id),
            _ => {}
        }
    }
}

/// Resolve a dot-notation field path (e.g. `"resource.kind"`) against a
/// JSON value.  Returns `None` when any segment is missing or the value is
/// JSON `null` — null is treated as absence.
fn resolve_path<'v>(value: &'v serde_json::Value, path: &str) -> Option<&'v serde_json::Value> {
    let mut current = value;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(v) if !v.is_null() => current = v,
            _ => return None,
        }
    }
    Some(current)
}

/// Compare two JSON values.  Returns `None` when the operands are not
/// comparable under `op` (e.g. ordering a string against a number).
fn compare(actual: &serde_json::Value, op: CmpOp, expected: &serde_json::Value) -> Option<Tri> {
    use serde_json::Value;

    let to_tri = |b: bool| if b { Tri::True } else { Tri::False };

    match op {
        // Equality is defined for any pair; numbers compare numerically so
        // 5 == 5.0 holds regardless of TOML/JSON integer representation.
        CmpOp::Eq | CmpOp::Ne => {
            let equal = match (actual, expected) {
                (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
                (a, b) => a == b,
            };
            Some(to_tri(if op == CmpOp::Eq { equal } else { !equal }))
        }

        // Ordering requires both operands numeric, or both strings.
        CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
            let ordering = match (actual, expected) {
                (Value::Number(a), Value::Number(b)) => {
                    a.as_f64().partial_cmp(&b.as_f64())
                }
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => None,
            }?;
            let holds = match op {
                CmpOp::Lt => ordering == std::cmp::Ordering::Less,
                CmpOp::Le => ordering != std::cmp::Ordering::Greater,
                CmpOp::Gt => ordering == std::cmp::Ordering::Greater,
                CmpOp::Ge => ordering != std::cmp::Ordering::Less,
                _ => unreachable!(),
            };
            Some(to_tri(holds))
        }
    }
}
