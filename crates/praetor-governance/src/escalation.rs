//! Tier-3 escalation case tracking.
//!
//! Forward-only lifecycle: `open → deliberating → resolved(outcome)`.
//! The deliberation itself happens outside the engine; the tracker holds
//! the cases, enforces transition order, and exposes their ages for
//! backlog alerting.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::info;

use praetor_contracts::{
    error::{PraetorError, PraetorResult},
    escalation::{CaseId, EscalationCase, EscalationStatus, ResolutionOutcome},
};

#[derive(Debug, Default)]
pub struct EscalationTracker {
    cases: Mutex<HashMap<CaseId, EscalationCase>>,
}

impl EscalationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CaseId, EscalationCase>> {
        self.cases.lock().expect("escalation tracker lock poisoned")
    }

    /// Open a new case.
    pub fn open(
        &self,
        description: String,
        concerns: Vec<String>,
        now: DateTime<Utc>,
    ) -> EscalationCase {
        let case = EscalationCase {
            id: CaseId::new(),
            description,
            concerns,
            status: EscalationStatus::Open,
            outcome: None,
            opened_at: now,
            resolved_at: None,
        };
        info!(case_id = %case.id, "escalation case opened");
        self.lock().insert(case.id, case.clone());
        case
    }

    pub fn get(&self, id: CaseId) -> PraetorResult<EscalationCase> {
        self.lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| PraetorError::NotFound {
                what: "escalation case".to_string(),
                id: id.to_string(),
            })
    }

    /// Move an open case into deliberation.
    pub fn begin_deliberation(&self, id: CaseId) -> PraetorResult<EscalationCase> {
        let mut cases = self.lock();
        let case = cases.get_mut(&id).ok_or_else(|| PraetorError::NotFound {
            what: "escalation case".to_string(),
            id: id.to_string(),
        })?;
        if case.status != EscalationStatus::Open {
            return Err(PraetorError::Conflict {
                reason: format!("expected status open, found {:?}", case.status),
            });
        }
        case.status = EscalationStatus::Deliberating;
        Ok(case.clone())
    }

    /// Resolve a deliberating case with the board's ruling.
    pub fn resolve(
        &self,
        id: CaseId,
        outcome: ResolutionOutcome,
        now: DateTime<Utc>,
    ) -> PraetorResult<EscalationCase> {
        let mut cases = self.lock();
        let case = cases.get_mut(&id).ok_or_else(|| PraetorError::NotFound {
            what: "escalation case".to_string(),
            id: id.to_string(),
        })?;
        if case.status != EscalationStatus::Deliberating {
            return Err(PraetorError::Conflict {
                reason: format!("expected status deliberating, found {:?}", case.status),
            });
        }
        case.status = EscalationStatus::Resolved;
        case.outcome = Some(outcome);
        case.resolved_at = Some(now);
        info!(case_id = %id, outcome = ?outcome, "escalation case resolved");
        Ok(case.clone())
    }

    /// Ids and ages of every unresolved case, oldest first.
    pub fn open_case_ages(&self, now: DateTime<Utc>) -> Vec<(CaseId, chrono::Duration)> {
        let cases = self.lock();
        let mut ages: Vec<(CaseId, chrono::Duration)> = cases
            .values()
            .filter(|c| c.status != EscalationStatus::Resolved)
            .map(|c| (c.id, c.age(now)))
            .collect();
        ages.sort_by(|a, b| b.1.cmp(&a.1));
        ages
    }
}
