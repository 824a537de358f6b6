//! The engine facade.
//!
//! `Engine` wires the trait seams together and exposes the external
//! operations: `evaluate`, `submit_exception`, `review_exception`,
//! `withdraw_exception`, `escalate`, the escalation transitions,
//! `run_expiry_sweep`, and `get_metrics`.
//!
//! Every operation — success or failure — appends exactly one audit
//! record per decision or transition before returning.  Lazy expiry
//! transitions applied along the way are audited under the `"system"`
//! actor, as is the sweep.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use praetor_contracts::{
    audit::DecisionPayload,
    error::{PraetorError, PraetorResult},
    escalation::{CaseId, EscalationCase, ResolutionOutcome},
    exception::{ExceptionId, ExceptionRequest, ExceptionStatus, ReviewDecision, Tier},
    request::{EvaluationRequest, RequestMetadata, ResourceDescriptor},
    verdict::{EvaluationResult, Verdict},
};
use praetor_core::{
    config::GovernanceConfig,
    traits::{AuditSink, Clock, Notifier, PolicyEvaluator, ReviewerDirectory},
};
use praetor_metrics::{MetricsAggregator, MetricsReport, Timeframe};

use crate::{
    exception::{AppliedTransition, ExceptionManager},
    escalation::EscalationTracker,
    risk::RiskClassifier,
    validate::validate_request,
};

const SYSTEM_ACTOR: &str = "system";

/// The fields of a `SubmitException` call.
///
/// The risk level is not part of the submission: the engine derives it
/// from `metadata` (with `requested_duration_secs` substituted for the
/// metadata's duration) through the configured classifier thresholds.
#[derive(Debug, Clone, Serialize)]
pub struct ExceptionSubmission {
    pub policy_id: String,
    pub resource: ResourceDescriptor,
    pub requester: String,
    pub justification: String,
    pub mitigation: String,
    pub requested_duration_secs: i64,
    pub metadata: RequestMetadata,
}

/// What `submit_exception` hands back to the caller.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub request: ExceptionRequest,
    /// The escalation case opened alongside a tier-3 submission.
    pub case: Option<EscalationCase>,
}

/// The governance engine: policy evaluation, risk routing, exception
/// lifecycle, escalation tracking, audit, and metrics behind one facade.
pub struct Engine {
    evaluator: Box<dyn PolicyEvaluator>,
    audit: Arc<dyn AuditSink>,
    reviewers: Box<dyn ReviewerDirectory>,
    notifier: Box<dyn Notifier>,
    clock: Box<dyn Clock>,
    config: GovernanceConfig,
    classifier: RiskClassifier,
    exceptions: ExceptionManager,
    escalations: EscalationTracker,
    metrics: Mutex<MetricsAggregator>,
}

impl Engine {
    pub fn new(
        evaluator: Box<dyn PolicyEvaluator>,
        audit: Arc<dyn AuditSink>,
        reviewers: Box<dyn ReviewerDirectory>,
        notifier: Box<dyn Notifier>,
        clock: Box<dyn Clock>,
        config: GovernanceConfig,
    ) -> Self {
        let classifier = RiskClassifier::new(config.risk.clone());
        let metrics = Mutex::new(MetricsAggregator::new(config.metrics.retention_hours));
        Self {
            evaluator,
            audit,
            reviewers,
            notifier,
            clock,
            config,
            classifier,
            exceptions: ExceptionManager::new(),
            escalations: EscalationTracker::new(),
            metrics,
        }
    }

    // ── Evaluate ──────────────────────────────────────────────────────────────

    /// Evaluate a request against the named policy sets.
    ///
    /// Validation failures and unknown policies fail the whole evaluation;
    /// both paths still append an audit record.  A deny covered by an
    /// active exception is overridden to allow, with the exception id
    /// recorded on the result.
    pub fn evaluate(
        &self,
        policy_ids: &[String],
        request: &EvaluationRequest,
    ) -> PraetorResult<EvaluationResult> {
        let input = to_input(request);

        if let Err(e) = validate_request(&input) {
            self.audit_failure(&request.actor, &e, &input)?;
            return Err(e);
        }

        let mut result = match self.evaluator.evaluate(policy_ids, request) {
            Ok(result) => result,
            Err(e) => {
                self.audit_failure(&request.actor, &e, &input)?;
                return Err(e);
            }
        };

        if result.verdict == Verdict::Deny {
            let now = self.clock.now();
            for policy_id in policy_ids {
                let (active, expiries) =
                    self.exceptions
                        .active_exception_for(policy_id, &request.resource, now);
                self.audit_expiries(&expiries)?;
                if let Some(exception_id) = active {
                    info!(
                        %exception_id,
                        resource_kind = %request.resource.kind,
                        resource_name = %request.resource.name,
                        "deny overridden by active exception"
                    );
                    result.verdict = Verdict::Allow;
                    result.exception_override = Some(exception_id);
                    break;
                }
            }
        }

        let payload = DecisionPayload::Evaluation {
            policies: result.policies.clone(),
            resource: request.resource.clone(),
            verdict: result.verdict,
            matched_rule_ids: result.matched.iter().map(|m| m.rule_id.clone()).collect(),
            violations: result.violations.clone(),
            exception_override: result.exception_override,
        };
        let record = self.audit.append(&request.actor, payload, &input)?;
        self.notifier.notify(&record.payload);

        debug!(
            verdict = ?result.verdict,
            matched = result.matched.len(),
            elapsed_micros = result.elapsed_micros,
            "evaluation complete"
        );
        Ok(result)
    }

    // ── SubmitException ───────────────────────────────────────────────────────

    /// Submit an exception request and route it through the tier protocol.
    ///
    /// The risk level is classified from the submission's metadata, with
    /// the requested duration feeding the duration band.  Tier 1 (low risk
    /// on a whitelisted policy) is approved immediately under the
    /// `"system"` actor.  Tier 3 additionally opens a linked escalation
    /// case.  Rejected submissions are audited before the error returns.
    pub fn submit_exception(
        &self,
        submission: ExceptionSubmission,
    ) -> PraetorResult<SubmissionOutcome> {
        let input = to_input(&submission);

        if let Err(e) = validate_submission(&submission) {
            self.audit_submission_rejected(&submission, &e, &input)?;
            return Err(e);
        }

        let now = self.clock.now();

        let mut metadata = submission.metadata.clone();
        metadata.requested_duration_secs = Some(submission.requested_duration_secs);
        let risk_level = self.classifier.classify(&metadata);

        let whitelisted = self
            .evaluator
            .auto_approval_whitelisted(&submission.policy_id, &submission.resource)?;
        let tier = self.classifier.tier_for(risk_level, whitelisted);

        let assigned_reviewers = if tier == Tier::Automated {
            Vec::new()
        } else {
            let pool = self.reviewers.reviewers_for(risk_level);
            if pool.is_empty() {
                let e = PraetorError::ConfigError {
                    reason: format!("no reviewers configured for risk level {:?}", risk_level),
                };
                self.audit_submission_rejected(&submission, &e, &input)?;
                return Err(e);
            }
            pool
        };

        let mut request = ExceptionRequest {
            id: ExceptionId::new(),
            policy_id: submission.policy_id.clone(),
            resource: submission.resource.clone(),
            requester: submission.requester.clone(),
            justification: submission.justification.clone(),
            mitigation: submission.mitigation.clone(),
            requested_duration_secs: submission.requested_duration_secs,
            risk_level,
            tier,
            status: ExceptionStatus::PendingReview,
            assigned_reviewers: assigned_reviewers.clone(),
            approvals: Vec::new(),
            approved_at: None,
            denial_reason: None,
            created_at: now,
        };

        let record = self.audit.append(
            &submission.requester,
            DecisionPayload::ExceptionSubmitted {
                exception_id: request.id,
                policy_id: request.policy_id.clone(),
                resource: request.resource.clone(),
                risk_level: request.risk_level,
                tier,
                assigned_reviewers,
            },
            &input,
        )?;
        self.notifier.notify(&record.payload);

        if tier == Tier::Automated {
            request.status = ExceptionStatus::Approved;
            request.approved_at = Some(now);
            let record = self.audit.append(
                SYSTEM_ACTOR,
                DecisionPayload::ExceptionTransition {
                    exception_id: request.id,
                    from: ExceptionStatus::PendingReview,
                    to: ExceptionStatus::Approved,
                    reviewer: None,
                    reason: Some("automated tier-1 approval".to_string()),
                },
                &input,
            )?;
            self.notifier.notify(&record.payload);
        }

        let case = if tier == Tier::EthicsEscalation {
            let case = self.escalations.open(
                format!(
                    "exception {} for {}/{} under policy '{}'",
                    request.id, request.resource.kind, request.resource.name, request.policy_id
                ),
                vec![submission.justification.clone()],
                now,
            );
            let record = self.audit.append(
                &submission.requester,
                DecisionPayload::EscalationOpened {
                    case_id: case.id,
                    concerns: case.concerns.clone(),
                },
                &input,
            )?;
            self.notifier.notify(&record.payload);
            Some(case)
        } else {
            None
        };

        self.exceptions.insert(request.clone());
        Ok(SubmissionOutcome { request, case })
    }

    // ── ReviewException ───────────────────────────────────────────────────────

    /// Apply one reviewer decision to a pending exception.
    ///
    /// Rejections — unauthorized reviewer, lost optimistic race, expired
    /// request — are audited just like successful transitions.
    pub fn review_exception(
        &self,
        id: ExceptionId,
        reviewer: &str,
        decision: ReviewDecision,
        reason: Option<&str>,
    ) -> PraetorResult<ExceptionStatus> {
        let now = self.clock.now();
        let input = serde_json::json!({
            "exception_id": id.to_string(),
            "reviewer": reviewer,
            "decision": decision,
            "reason": reason,
        });

        let (snapshot, expiry) = self.exceptions.get(id, now)?;
        self.audit_expiries(expiry.as_slice())?;

        if !self.reviewers.is_authorized(reviewer, &snapshot) {
            let e = PraetorError::Unauthorized {
                reviewer: reviewer.to_string(),
                reason: "not in the exception's assigned reviewer list".to_string(),
            };
            self.audit.append(
                reviewer,
                DecisionPayload::ExceptionTransitionRejected {
                    exception_id: id,
                    attempted: decision_name(decision).to_string(),
                    reason: e.to_string(),
                },
                &input,
            )?;
            return Err(e);
        }

        let quorum = self.config.quorum.for_risk(snapshot.risk_level);
        match self
            .exceptions
            .review(id, reviewer, decision, reason, quorum, now)
        {
            Ok(outcome) => {
                let transition_reason = if outcome.quorum_pending {
                    Some(format!(
                        "approval recorded ({} of {})",
                        outcome.request.approvals.len(),
                        quorum
                    ))
                } else {
                    reason.map(str::to_string)
                };
                let record = self.audit.append(
                    reviewer,
                    DecisionPayload::ExceptionTransition {
                        exception_id: id,
                        from: outcome.from,
                        to: outcome.to,
                        reviewer: Some(reviewer.to_string()),
                        reason: transition_reason,
                    },
                    &input,
                )?;
                self.notifier.notify(&record.payload);
                Ok(outcome.to)
            }
            Err(e) => {
                warn!(exception_id = %id, reviewer, error = %e, "review rejected");
                self.audit.append(
                    reviewer,
                    DecisionPayload::ExceptionTransitionRejected {
                        exception_id: id,
                        attempted: decision_name(decision).to_string(),
                        reason: e.to_string(),
                    },
                    &input,
                )?;
                Err(e)
            }
        }
    }

    /// Requester-initiated withdrawal of a pending exception.
    pub fn withdraw_exception(
        &self,
        id: ExceptionId,
        requester: &str,
    ) -> PraetorResult<ExceptionStatus> {
        let now = self.clock.now();
        let input = serde_json::json!({
            "exception_id": id.to_string(),
            "requester": requester,
        });

        match self.exceptions.withdraw(id, requester, now) {
            Ok(request) => {
                let record = self.audit.append(
                    requester,
                    DecisionPayload::ExceptionTransition {
                        exception_id: id,
                        from: ExceptionStatus::PendingReview,
                        to: ExceptionStatus::Withdrawn,
                        reviewer: None,
                        reason: None,
                    },
                    &input,
                )?;
                self.notifier.notify(&record.payload);
                Ok(request.status)
            }
            Err(e) => {
                self.audit.append(
                    requester,
                    DecisionPayload::ExceptionTransitionRejected {
                        exception_id: id,
                        attempted: "withdraw".to_string(),
                        reason: e.to_string(),
                    },
                    &input,
                )?;
                Err(e)
            }
        }
    }

    /// Fetch an exception, applying (and auditing) lazy expiry.
    pub fn get_exception(&self, id: ExceptionId) -> PraetorResult<ExceptionRequest> {
        let (request, expiry) = self.exceptions.get(id, self.clock.now())?;
        self.audit_expiries(expiry.as_slice())?;
        Ok(request)
    }

    // ── Escalate ──────────────────────────────────────────────────────────────

    /// Open a standalone tier-3 escalation case.
    pub fn escalate(
        &self,
        opened_by: &str,
        description: String,
        concerns: Vec<String>,
    ) -> PraetorResult<EscalationCase> {
        let input = serde_json::json!({
            "description": description,
            "concerns": concerns,
        });
        if description.trim().is_empty() {
            let e = PraetorError::Validation {
                reason: "escalation description must not be empty".to_string(),
            };
            self.audit.append(
                opened_by,
                DecisionPayload::EscalationRejected {
                    reason: e.to_string(),
                },
                &input,
            )?;
            return Err(e);
        }
        let case = self.escalations.open(description, concerns, self.clock.now());
        let record = self.audit.append(
            opened_by,
            DecisionPayload::EscalationOpened {
                case_id: case.id,
                concerns: case.concerns.clone(),
            },
            &input,
        )?;
        self.notifier.notify(&record.payload);
        Ok(case)
    }

    /// Move an open case into deliberation.
    pub fn begin_deliberation(&self, actor: &str, id: CaseId) -> PraetorResult<EscalationCase> {
        use praetor_contracts::escalation::EscalationStatus;
        let input = serde_json::json!({ "case_id": id.to_string() });
        match self.escalations.begin_deliberation(id) {
            Ok(case) => {
                let record = self.audit.append(
                    actor,
                    DecisionPayload::EscalationTransition {
                        case_id: id,
                        from: EscalationStatus::Open,
                        to: EscalationStatus::Deliberating,
                        outcome: None,
                    },
                    &input,
                )?;
                self.notifier.notify(&record.payload);
                Ok(case)
            }
            Err(e) => {
                self.audit.append(
                    actor,
                    DecisionPayload::EscalationTransitionRejected {
                        case_id: id,
                        attempted: "begin_deliberation".to_string(),
                        reason: e.to_string(),
                    },
                    &input,
                )?;
                Err(e)
            }
        }
    }

    /// Resolve a deliberating case with the board's ruling.
    pub fn resolve_escalation(
        &self,
        actor: &str,
        id: CaseId,
        outcome: ResolutionOutcome,
    ) -> PraetorResult<EscalationCase> {
        use praetor_contracts::escalation::EscalationStatus;
        let input = serde_json::json!({
            "case_id": id.to_string(),
            "outcome": outcome,
        });
        match self.escalations.resolve(id, outcome, self.clock.now()) {
            Ok(case) => {
                let record = self.audit.append(
                    actor,
                    DecisionPayload::EscalationTransition {
                        case_id: id,
                        from: EscalationStatus::Deliberating,
                        to: EscalationStatus::Resolved,
                        outcome: Some(outcome),
                    },
                    &input,
                )?;
                self.notifier.notify(&record.payload);
                Ok(case)
            }
            Err(e) => {
                self.audit.append(
                    actor,
                    DecisionPayload::EscalationTransitionRejected {
                        case_id: id,
                        attempted: "resolve".to_string(),
                        reason: e.to_string(),
                    },
                    &input,
                )?;
                Err(e)
            }
        }
    }

    pub fn get_case(&self, id: CaseId) -> PraetorResult<EscalationCase> {
        self.escalations.get(id)
    }

    /// Ids and ages of unresolved escalation cases, oldest first.
    pub fn open_case_ages(&self) -> Vec<(CaseId, chrono::Duration)> {
        self.escalations.open_case_ages(self.clock.now())
    }

    // ── Expiry sweep ──────────────────────────────────────────────────────────

    /// Run the idempotent expiry sweep and audit every forced transition.
    pub fn run_expiry_sweep(&self) -> PraetorResult<usize> {
        let transitions = self.exceptions.sweep(self.clock.now());
        self.audit_expiries(&transitions)?;
        Ok(transitions.len())
    }

    // ── GetMetrics ────────────────────────────────────────────────────────────

    /// Ingest any new audit records and answer a windowed metrics query.
    pub fn get_metrics(&self, timeframe: Timeframe) -> PraetorResult<MetricsReport> {
        let now = self.clock.now();
        let mut metrics = self.metrics.lock().expect("metrics lock poisoned");
        let records = self.audit.records_since(metrics.cursor())?;
        metrics.ingest(&records, now);
        Ok(metrics.query(timeframe, now))
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn audit_failure(
        &self,
        actor: &str,
        error: &PraetorError,
        input: &Value,
    ) -> PraetorResult<()> {
        warn!(actor, error = %error, "evaluation failed");
        self.audit.append(
            actor,
            DecisionPayload::EvaluationFailed {
                reason: error.to_string(),
            },
            input,
        )?;
        Ok(())
    }

    fn audit_submission_rejected(
        &self,
        submission: &ExceptionSubmission,
        error: &PraetorError,
        input: &Value,
    ) -> PraetorResult<()> {
        warn!(
            requester = %submission.requester,
            policy_id = %submission.policy_id,
            error = %error,
            "exception submission rejected"
        );
        self.audit.append(
            &submission.requester,
            DecisionPayload::ExceptionSubmissionRejected {
                policy_id: submission.policy_id.clone(),
                resource: submission.resource.clone(),
                reason: error.to_string(),
            },
            input,
        )?;
        Ok(())
    }

    fn audit_expiries(&self, transitions: &[AppliedTransition]) -> PraetorResult<()> {
        for transition in transitions {
            let input = serde_json::json!({
                "exception_id": transition.exception_id.to_string(),
            });
            let record = self.audit.append(
                SYSTEM_ACTOR,
                DecisionPayload::ExceptionTransition {
                    exception_id: transition.exception_id,
                    from: transition.from,
                    to: transition.to,
                    reviewer: None,
                    reason: Some("validity window elapsed".to_string()),
                },
                &input,
            )?;
            self.notifier.notify(&record.payload);
        }
        Ok(())
    }
}

fn validate_submission(submission: &ExceptionSubmission) -> PraetorResult<()> {
    if submission.justification.trim().is_empty() {
        return Err(PraetorError::Validation {
            reason: "exception justification must not be empty".to_string(),
        });
    }
    if submission.mitigation.trim().is_empty() {
        return Err(PraetorError::Validation {
            reason: "exception mitigation must not be empty".to_string(),
        });
    }
    if submission.requested_duration_secs <= 0 {
        return Err(PraetorError::Validation {
            reason: "requested duration must be positive".to_string(),
        });
    }
    Ok(())
}

fn decision_name(decision: ReviewDecision) -> &'static str {
    match decision {
        ReviewDecision::Approve => "approve",
        ReviewDecision::Deny => "deny",
    }
}

fn to_input(value: &impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
