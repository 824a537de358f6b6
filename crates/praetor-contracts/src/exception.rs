//! Exception request types and governance routing tiers.
//!
//! An exception is a time-bound, reviewer-approved override of an otherwise
//! denying verdict.  The state machine lives in praetor-governance; this
//! module only defines the data shapes.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::request::ResourceDescriptor;

/// Unique identifier for an exception request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExceptionId(pub uuid::Uuid);

impl ExceptionId {
    /// Create a new, unique exception ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ExceptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExceptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Discrete risk level assigned by the risk classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// The governance routing level for a require-approval outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Tier 1: automated approval, available only to low-risk requests
    /// whose matched policy explicitly whitelists it.
    Automated,
    /// Tier 2: managed exception with human review.
    ManagedException,
    /// Tier 3: ethics escalation requiring open-ended deliberation.
    EthicsEscalation,
}

impl Tier {
    /// The conventional tier number (1, 2, or 3).
    pub fn number(&self) -> u8 {
        match self {
            Tier::Automated => 1,
            Tier::ManagedException => 2,
            Tier::EthicsEscalation => 3,
        }
    }
}

/// Lifecycle status of an exception request.
///
/// `Denied`, `Expired`, and `Withdrawn` are terminal: no transition leaves
/// them.  `Approved` admits exactly one further transition, to `Expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionStatus {
    PendingReview,
    Approved,
    Denied,
    Expired,
    Withdrawn,
}

impl ExceptionStatus {
    /// True for statuses that admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExceptionStatus::Denied | ExceptionStatus::Expired | ExceptionStatus::Withdrawn
        )
    }
}

/// A reviewer's decision on a pending exception request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Deny,
}

/// A time-bound request to override a denying policy verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionRequest {
    pub id: ExceptionId,

    /// The policy set the exception applies to.
    pub policy_id: String,

    /// The resource the override covers.
    pub resource: ResourceDescriptor,

    /// Who requested the exception.
    pub requester: String,

    /// Why the override is needed.
    pub justification: String,

    /// The proposed mitigation while the exception stands.
    pub mitigation: String,

    /// How long the exception remains valid after approval, in seconds.
    pub requested_duration_secs: i64,

    /// Risk level assigned at submission.
    pub risk_level: RiskLevel,

    /// Governance tier the request was routed to.
    pub tier: Tier,

    /// Current lifecycle status.
    pub status: ExceptionStatus,

    /// Reviewers the request was routed to.
    pub assigned_reviewers: Vec<String>,

    /// Reviewers who have approved so far (quorum may require several).
    pub approvals: Vec<String>,

    /// Set when the request reaches `Approved`.
    pub approved_at: Option<DateTime<Utc>>,

    /// Set when the request reaches `Denied`.
    pub denial_reason: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl ExceptionRequest {
    /// The instant the exception stops being valid, if approved.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
            .map(|at| at + Duration::seconds(self.requested_duration_secs))
    }

    /// True when the exception is approved but its validity window has
    /// passed.  Expiry is re-derived from `approved_at + duration` at every
    /// read, so staleness never outlives the instant it is observed.
    pub fn is_time_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == ExceptionStatus::Approved
            && self.expires_at().is_some_and(|exp| now > exp)
    }

    /// True when the exception actively covers its resource at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == ExceptionStatus::Approved && !self.is_time_expired(now)
    }
}
