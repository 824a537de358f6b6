//! Audit record types.
//!
//! `AuditRecord` is a single immutable entry in the tamper-evident decision
//! log.  Exactly one record exists per decision or state transition —
//! including failed and conflicting ones.  The hashing and chain logic live
//! in praetor-audit; this module only defines the shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    escalation::{CaseId, EscalationStatus, ResolutionOutcome},
    exception::{ExceptionId, ExceptionStatus, RiskLevel, Tier},
    request::ResourceDescriptor,
    verdict::{PolicyRef, Verdict},
};

/// The decision or transition an audit record captures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DecisionPayload {
    /// One completed rule evaluation.
    Evaluation {
        policies: Vec<PolicyRef>,
        resource: ResourceDescriptor,
        verdict: Verdict,
        matched_rule_ids: Vec<String>,
        violations: Vec<String>,
        exception_override: Option<ExceptionId>,
    },

    /// An evaluation that failed before producing a verdict
    /// (validation failure or unknown policy set).
    EvaluationFailed { reason: String },

    /// A new policy set version was published to the store.
    PolicyPublished {
        policy_id: String,
        version: String,
        rule_count: usize,
    },

    /// A policy document was rejected at load time.
    PolicyLoadRejected { policy_id: String, reason: String },

    /// A new exception request entered the governance protocol.
    ExceptionSubmitted {
        exception_id: ExceptionId,
        policy_id: String,
        resource: ResourceDescriptor,
        risk_level: RiskLevel,
        tier: Tier,
        assigned_reviewers: Vec<String>,
    },

    /// A submission rejected before any exception entered the protocol
    /// (validation failure or missing reviewer pool).
    ExceptionSubmissionRejected {
        policy_id: String,
        resource: ResourceDescriptor,
        reason: String,
    },

    /// An exception request changed status.
    ExceptionTransition {
        exception_id: ExceptionId,
        from: ExceptionStatus,
        to: ExceptionStatus,
        reviewer: Option<String>,
        reason: Option<String>,
    },

    /// An attempted exception transition that was rejected (conflict,
    /// authorization failure, or terminal-state violation).
    ExceptionTransitionRejected {
        exception_id: ExceptionId,
        attempted: String,
        reason: String,
    },

    /// An escalation request rejected before a case was opened.
    EscalationRejected { reason: String },

    /// A new tier-3 escalation case was opened.
    EscalationOpened {
        case_id: CaseId,
        concerns: Vec<String>,
    },

    /// An escalation case advanced.
    EscalationTransition {
        case_id: CaseId,
        from: EscalationStatus,
        to: EscalationStatus,
        outcome: Option<ResolutionOutcome>,
    },

    /// An attempted escalation transition that was rejected.
    EscalationTransitionRejected {
        case_id: CaseId,
        attempted: String,
        reason: String,
    },
}

/// An immutable, sequentially ordered entry in the audit log.
///
/// Each record commits to the previous one via `prev_hash`, forming an
/// append-only SHA-256 chain.  Modifying any field — including those of the
/// embedded payload — invalidates `this_hash` and every subsequent
/// `prev_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Strictly increasing position in the log, starting at 0.
    pub sequence: u64,

    /// Wall-clock time (UTC) the record was appended.
    pub timestamp: DateTime<Utc>,

    /// The actor responsible for the decision or transition
    /// (requester, reviewer, or `"system"` for the expiry sweep).
    pub actor: String,

    /// What happened.
    pub payload: DecisionPayload,

    /// SHA-256 hash (hex) of the canonical JSON of the triggering input.
    pub input_hash: String,

    /// SHA-256 hash (hex) of the previous record, or `GENESIS_HASH` for
    /// the first record.
    pub prev_hash: String,

    /// SHA-256 hash (hex) of this record's canonical content.
    pub this_hash: String,
}

impl AuditRecord {
    /// The sentinel `prev_hash` used for the first record in every log.
    ///
    /// 64 hex zeros — a value that can never be the SHA-256 of real data,
    /// making genesis detection unambiguous.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}
