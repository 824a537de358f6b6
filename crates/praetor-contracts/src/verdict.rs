//! Verdict and evaluation result types.
//!
//! The rule evaluator consumes an `EvaluationRequest` and produces an
//! `EvaluationResult`.  PRAETOR is fail-closed: the absence of an explicit
//! allow match is a deny, not a permission.

use serde::{Deserialize, Serialize};

use crate::exception::ExceptionId;

/// The outcome of evaluating a request against a policy set.
///
/// Also used as the kind of an individual rule: the rule's `kind` is the
/// verdict it contributes when its predicate matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The change is permitted.
    Allow,
    /// The change is refused.
    Deny,
    /// The change cannot be resolved automatically and must be routed
    /// through the tiered governance protocol.
    RequireApproval,
}

/// A rule that matched during evaluation, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMatch {
    /// The matched rule's stable identifier.
    pub rule_id: String,
    /// The verdict kind the rule contributes.
    pub kind: Verdict,
}

/// Identifies one policy set version consulted during an evaluation.
///
/// Every result names the exact versions used, so any evaluation can be
/// reproduced bit-for-bit against the same immutable sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRef {
    pub policy_id: String,
    pub version: String,
}

/// The complete outcome of one evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// The resolved verdict after deny > require_approval > allow
    /// precedence and the fail-closed default.
    pub verdict: Verdict,

    /// Every rule that matched, preserved in declaration order for audit
    /// readability — independent of the commutative resolution above.
    pub matched: Vec<RuleMatch>,

    /// Violation messages from matched deny rules (plus the fail-closed
    /// default message when nothing matched).
    pub violations: Vec<String>,

    /// Warnings, e.g. predicate references to attributes absent from the
    /// request (undefined counts as non-match, not as an error).
    pub warnings: Vec<String>,

    /// The exact policy set versions consulted.
    pub policies: Vec<PolicyRef>,

    /// Set when an active, non-expired exception overrode an underlying
    /// deny verdict.
    pub exception_override: Option<ExceptionId>,

    /// Evaluation latency in microseconds.
    pub elapsed_micros: u64,
}
