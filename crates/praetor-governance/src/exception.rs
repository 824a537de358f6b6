//! Exception request lifecycle.
//!
//! States: `pending_review` (initial) → `approved` | `denied` | `withdrawn`;
//! `approved` → `expired`.  `denied`, `expired`, and `withdrawn` are
//! terminal.  Transitions use optimistic concurrency: each one re-checks
//! the current status under the manager lock, and a lost race surfaces as
//! `Conflict` instead of overwriting the winner.
//!
//! Expiry is derived from `approved_at + requested_duration` at every read
//! (`get`, `active_exception_for`) as well as by the idempotent `sweep`.
//! A pending review that outlives its requested duration is forced to
//! `expired` by the sweep, so no request waits on a reviewer forever.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use praetor_contracts::{
    error::{PraetorError, PraetorResult},
    exception::{ExceptionId, ExceptionRequest, ExceptionStatus, ReviewDecision},
    request::ResourceDescriptor,
};

/// A status change applied to an exception, returned so the caller can
/// record it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTransition {
    pub exception_id: ExceptionId,
    pub from: ExceptionStatus,
    pub to: ExceptionStatus,
}

/// The result of one reviewer action.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    /// The request after the action was applied.
    pub request: ExceptionRequest,
    pub from: ExceptionStatus,
    pub to: ExceptionStatus,
    /// True when an approval was recorded but quorum is not yet reached
    /// (`from == to == PendingReview`).
    pub quorum_pending: bool,
}

/// In-memory store of exception requests with optimistic transitions.
#[derive(Debug, Default)]
pub struct ExceptionManager {
    requests: Mutex<HashMap<ExceptionId, ExceptionRequest>>,
}

impl ExceptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ExceptionId, ExceptionRequest>> {
        self.requests.lock().expect("exception manager lock poisoned")
    }

    /// Register a newly submitted request.
    pub fn insert(&self, request: ExceptionRequest) {
        debug!(exception_id = %request.id, tier = request.tier.number(), "exception registered");
        self.lock().insert(request.id, request);
    }

    /// Fetch a request, applying lazy expiry first.
    ///
    /// If the request is approved but its validity window has passed, it is
    /// flipped to `expired` before being returned, and the applied
    /// transition is reported so the caller can audit it.
    pub fn get(
        &self,
        id: ExceptionId,
        now: DateTime<Utc>,
    ) -> PraetorResult<(ExceptionRequest, Option<AppliedTransition>)> {
        let mut requests = self.lock();
        let request = requests.get_mut(&id).ok_or_else(|| PraetorError::NotFound {
            what: "exception".to_string(),
            id: id.to_string(),
        })?;
        let expiry = Self::apply_lazy_expiry(request, now);
        Ok((request.clone(), expiry))
    }

    /// Apply one reviewer decision under the optimistic status check.
    ///
    /// Accepted only while the request is still `pending_review` and not
    /// past its time window; everything else is a `Conflict`.  A duplicate
    /// approval by the same reviewer is idempotent.  Denials require a
    /// non-empty reason.
    pub fn review(
        &self,
        id: ExceptionId,
        reviewer: &str,
        decision: ReviewDecision,
        reason: Option<&str>,
        quorum: usize,
        now: DateTime<Utc>,
    ) -> PraetorResult<ReviewOutcome> {
        let mut requests = self.lock();
        let request = requests.get_mut(&id).ok_or_else(|| PraetorError::NotFound {
            what: "exception".to_string(),
            id: id.to_string(),
        })?;

        if Self::apply_lazy_expiry(request, now).is_some() {
            return Err(PraetorError::Conflict {
                reason: format!(
                    "exception expired at {} before the review was applied",
                    request
                        .expires_at()
                        .map(|at| at.to_rfc3339())
                        .unwrap_or_default(),
                ),
            });
        }

        if request.status != ExceptionStatus::PendingReview {
            return Err(PraetorError::Conflict {
                reason: format!(
                    "expected status pending_review, found {:?}",
                    request.status
                ),
            });
        }

        let from = request.status;
        match decision {
            ReviewDecision::Approve => {
                if !request.approvals.iter().any(|r| r == reviewer) {
                    request.approvals.push(reviewer.to_string());
                }
                if request.approvals.len() >= quorum {
                    request.status = ExceptionStatus::Approved;
                    request.approved_at = Some(now);
                    info!(
                        exception_id = %id,
                        approvals = request.approvals.len(),
                        "exception approved"
                    );
                } else {
                    debug!(
                        exception_id = %id,
                        approvals = request.approvals.len(),
                        quorum,
                        "approval recorded, quorum pending"
                    );
                }
            }
            ReviewDecision::Deny => {
                let reason = reason
                    .filter(|r| !r.trim().is_empty())
                    .ok_or_else(|| PraetorError::Validation {
                        reason: "denial requires a non-empty reason".to_string(),
                    })?;
                request.status = ExceptionStatus::Denied;
                request.denial_reason = Some(reason.to_string());
                info!(exception_id = %id, reviewer, "exception denied");
            }
        }

        let to = request.status;
        Ok(ReviewOutcome {
            request: request.clone(),
            from,
            to,
            quorum_pending: from == to,
        })
    }

    /// Requester-initiated cancellation of a pending request.
    pub fn withdraw(
        &self,
        id: ExceptionId,
        requester: &str,
        now: DateTime<Utc>,
    ) -> PraetorResult<ExceptionRequest> {
        let mut requests = self.lock();
        let request = requests.get_mut(&id).ok_or_else(|| PraetorError::NotFound {
            what: "exception".to_string(),
            id: id.to_string(),
        })?;

        if request.requester != requester {
            return Err(PraetorError::Unauthorized {
                reviewer: requester.to_string(),
                reason: "only the requester may withdraw an exception".to_string(),
            });
        }
        Self::apply_lazy_expiry(request, now);
        if request.status != ExceptionStatus::PendingReview {
            return Err(PraetorError::Conflict {
                reason: format!(
                    "expected status pending_review, found {:?}",
                    request.status
                ),
            });
        }

        request.status = ExceptionStatus::Withdrawn;
        info!(exception_id = %id, "exception withdrawn");
        Ok(request.clone())
    }

    /// Force-expire everything past its window.  Idempotent: re-running at
    /// the same instant transitions nothing.
    ///
    /// Covers approved requests past `approved_at + duration` and pending
    /// reviews past `created_at + duration` (the review deadline).
    pub fn sweep(&self, now: DateTime<Utc>) -> Vec<AppliedTransition> {
        let mut requests = self.lock();
        let mut applied = Vec::new();
        for request in requests.values_mut() {
            let review_deadline_passed = request.status == ExceptionStatus::PendingReview
                && now > request.created_at + Duration::seconds(request.requested_duration_secs);
            if request.is_time_expired(now) || review_deadline_passed {
                let from = request.status;
                request.status = ExceptionStatus::Expired;
                applied.push(AppliedTransition {
                    exception_id: request.id,
                    from,
                    to: ExceptionStatus::Expired,
                });
            }
        }
        if !applied.is_empty() {
            info!(count = applied.len(), "expiry sweep transitioned exceptions");
        }
        applied
    }

    /// The id of an active approved exception covering the given policy and
    /// resource at `now`, if any.  Lazy expiry is applied along the way.
    pub fn active_exception_for(
        &self,
        policy_id: &str,
        resource: &ResourceDescriptor,
        now: DateTime<Utc>,
    ) -> (Option<ExceptionId>, Vec<AppliedTransition>) {
        let mut requests = self.lock();
        let mut applied = Vec::new();
        let mut found = None;
        for request in requests.values_mut() {
            if request.policy_id != policy_id || &request.resource != resource {
                continue;
            }
            if let Some(expiry) = Self::apply_lazy_expiry(request, now) {
                applied.push(expiry);
            }
            if request.is_active(now) {
                found = Some(request.id);
            }
        }
        (found, applied)
    }

    /// Snapshot of every request, for the demo and for tests.
    pub fn snapshot(&self) -> Vec<ExceptionRequest> {
        self.lock().values().cloned().collect()
    }

    fn apply_lazy_expiry(
        request: &mut ExceptionRequest,
        now: DateTime<Utc>,
    ) -> Option<AppliedTransition> {
        if request.is_time_expired(now) {
            let from = request.status;
            request.status = ExceptionStatus::Expired;
            debug!(exception_id = %request.id, "lazy expiry applied at read");
            Some(AppliedTransition {
                exception_id: request.id,
                from,
                to: ExceptionStatus::Expired,
            })
        } else {
            None
        }
    }
}
