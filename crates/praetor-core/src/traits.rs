//! Core trait definitions for the PRAETOR governance pipeline.
//!
//! These traits define the engine's trust boundary and its seams to
//! external collaborators:
//!
//! - `PolicyEvaluator`   — deterministic rule evaluation (praetor-policy)
//! - `AuditSink`         — the serialized, append-only decision record
//! - `ReviewerDirectory` — identity provider supplying reviewer pools
//! - `Notifier`          — webhook/notification dispatcher (delivery retry
//!                         and backoff are its concern, not the engine's)
//! - `Clock`             — injectable time source so expiry is testable
//!
//! The engine wires them together; implementations of `Notifier` and
//! `ReviewerDirectory` are supplied by the hosting application.

use chrono::{DateTime, Utc};

use praetor_contracts::{
    audit::{AuditRecord, DecisionPayload},
    error::PraetorResult,
    exception::{ExceptionRequest, RiskLevel},
    request::{EvaluationRequest, ResourceDescriptor},
    verdict::EvaluationResult,
};

/// Deterministic rule evaluation against named policy sets.
///
/// Implementations are **trusted** and must be deterministic: identical
/// (request, policy version) pairs must always yield identical verdicts and
/// matched-rule sets.  Evaluation should be fast (microseconds) — load-time
/// validation guarantees predicate depth is bounded.
pub trait PolicyEvaluator: Send + Sync {
    /// Evaluate `request` against the current versions of the named policy
    /// sets.  An unknown policy id fails the whole evaluation with
    /// `PolicyNotFound`; no partial result is produced.
    fn evaluate(
        &self,
        policy_ids: &[String],
        request: &EvaluationRequest,
    ) -> PraetorResult<EvaluationResult>;

    /// True when the named policy's current version whitelists tier-1
    /// automated approval for the given resource.
    ///
    /// Low-risk exception requests are only eligible for automated approval
    /// when this returns true; otherwise they fall through to tier 2.
    fn auto_approval_whitelisted(
        &self,
        policy_id: &str,
        resource: &ResourceDescriptor,
    ) -> PraetorResult<bool>;
}

/// The audit sink: the single serialization point for every decision.
///
/// Every evaluation and every exception/escalation transition — success or
/// failure — appends exactly one record here.  A failed append is fatal:
/// a decision that cannot be audited cannot stand.
pub trait AuditSink: Send + Sync {
    /// Append one record.  The sink assigns the sequence number, hashes the
    /// triggering `input`, and links the record into its chain.
    ///
    /// Implementations must treat this as append-only: records are never
    /// modified or deleted.
    fn append(
        &self,
        actor: &str,
        payload: DecisionPayload,
        input: &serde_json::Value,
    ) -> PraetorResult<AuditRecord>;

    /// Return all records with `sequence >= since`, in order.
    ///
    /// Supports incremental consumers such as the metrics aggregator.
    fn records_since(&self, since: u64) -> PraetorResult<Vec<AuditRecord>>;

    /// Return a snapshot of every record written so far, in order.
    fn snapshot(&self) -> PraetorResult<Vec<AuditRecord>>;
}

/// Identity-provider seam supplying reviewer pools and authorization.
pub trait ReviewerDirectory: Send + Sync {
    /// The reviewers an exception at the given risk level is routed to.
    fn reviewers_for(&self, risk: RiskLevel) -> Vec<String>;

    /// Whether `reviewer` may act on `exception`.
    fn is_authorized(&self, reviewer: &str, exception: &ExceptionRequest) -> bool;
}

/// Notification dispatcher seam.
///
/// The engine informs it of decisions and state transitions; delivery,
/// retry, and backoff are the dispatcher's concern.  Must not fail the
/// calling operation.
pub trait Notifier: Send + Sync {
    fn notify(&self, payload: &DecisionPayload);
}

/// A `Notifier` that drops everything.  Default for embedded use.
#[derive(Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _payload: &DecisionPayload) {}
}

/// Injectable time source.
///
/// Exception expiry is derived from `approved_at + duration` against this
/// clock, so tests can step time instead of sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The production clock: wall-clock UTC.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A `ReviewerDirectory` backed by the static pools in `GovernanceConfig`.
///
/// Authorization is membership in the exception's assigned reviewer list.
/// Deployments with a real identity provider supply their own
/// implementation.
#[derive(Debug, Clone)]
pub struct StaticReviewerDirectory {
    low: Vec<String>,
    medium: Vec<String>,
    high: Vec<String>,
}

impl StaticReviewerDirectory {
    pub fn new(low: Vec<String>, medium: Vec<String>, high: Vec<String>) -> Self {
        Self { low, medium, high }
    }
}

impl ReviewerDirectory for StaticReviewerDirectory {
    fn reviewers_for(&self, risk: RiskLevel) -> Vec<String> {
        match risk {
            RiskLevel::Low => self.low.clone(),
            RiskLevel::Medium => self.medium.clone(),
            RiskLevel::High => self.high.clone(),
        }
    }

    fn is_authorized(&self, reviewer: &str, exception: &ExceptionRequest) -> bool {
        exception
            .assigned_reviewers
            .iter()
            .any(|r| r == reviewer)
    }
}
