//! Policy rule types and the TOML document schema.
//!
//! A `PolicyDocument` is deserialized from TOML and holds an ordered list
//! of `PolicyRule`s.  Matched rules are resolved commutatively — deny beats
//! require-approval beats allow — and the absence of any allow match is a
//! deny (fail-closed).

use serde::{Deserialize, Serialize};

use praetor_contracts::verdict::Verdict;

use crate::predicate::Predicate;

/// The verdict kind a rule contributes when its predicate matches.
///
/// Expressed in kebab-case in TOML for human readability:
/// ```toml
/// kind = "allow"
/// kind = "deny"
/// kind = "require-approval"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    Allow,
    Deny,
    RequireApproval,
}

impl RuleKind {
    /// Map the TOML-facing kind onto the contract verdict.
    pub fn verdict(&self) -> Verdict {
        match self {
            RuleKind::Allow => Verdict::Allow,
            RuleKind::Deny => Verdict::Deny,
            RuleKind::RequireApproval => Verdict::RequireApproval,
        }
    }
}

/// A single declarative policy rule.
///
/// Rules are scoped to a `namespace`; evaluation only considers rules in
/// namespaces the request references (or every rule when the request lists
/// none).  Declaration order is preserved in the matched-rule list for
/// audit readability, but never affects the verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Stable identifier used in audit records and `Ref` predicates.
    pub id: String,

    /// Namespace the rule belongs to (e.g. `"storage"`, `"iam"`).
    pub namespace: String,

    /// Human-readable explanation of what this rule controls.
    pub description: String,

    /// The verdict kind this rule contributes when it matches.
    pub kind: RuleKind,

    /// The condition under which the rule matches.
    pub predicate: Predicate,

    /// Mandatory for `deny` and `require-approval` rules.  Deny messages
    /// become violation entries in the evaluation result.
    pub message: Option<String>,

    /// When true, low-risk exception requests against this rule's policy
    /// are eligible for tier-1 automated approval.
    #[serde(default)]
    pub auto_approve: bool,
}

/// The top-level structure deserialized from a TOML policy document.
///
/// Example:
/// ```toml
/// policy_id = "infra-baseline"
/// version = "v1"
///
/// [[rules]]
/// id = "deny-unencrypted-bucket"
/// namespace = "storage"
/// description = "Buckets must declare server-side encryption"
/// kind = "deny"
/// message = "storage bucket is missing server-side encryption"
///
/// [rules.predicate]
/// type = "absent"
/// field = "encryption"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Stable identifier of the policy set this document publishes.
    pub policy_id: String,

    /// Version identifier; each published version is immutable.
    pub version: String,

    /// Ordered list of rules.
    pub rules: Vec<PolicyRule>,
}
