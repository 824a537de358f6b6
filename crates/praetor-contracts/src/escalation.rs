//! Escalation case types for tier-3 ethical deliberation.
//!
//! The oversight board is an external actor; PRAETOR only tracks the case
//! lifecycle and its age for backlog alerting.  No deliberation logic is
//! simulated.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for an escalation case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseId(pub uuid::Uuid);

impl CaseId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for CaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle status of an escalation case.  Forward-only:
/// `Open → Deliberating → Resolved`; `Resolved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationStatus {
    Open,
    Deliberating,
    Resolved,
}

/// The board's ruling on a resolved case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Approved,
    Denied,
    PolicyAmendmentRequired,
}

/// A tier-3 matter requiring human ethical deliberation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationCase {
    pub id: CaseId,

    /// What is being deliberated.
    pub description: String,

    /// The ethical concerns raised at escalation time.
    pub concerns: Vec<String>,

    pub status: EscalationStatus,

    /// Set when the case reaches `Resolved`.
    pub outcome: Option<ResolutionOutcome>,

    pub opened_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl EscalationCase {
    /// How long the case has been open (or took to resolve).
    ///
    /// Consumed by external alerting to flag deliberation backlogs.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        self.resolved_at.unwrap_or(now) - self.opened_at
    }
}
