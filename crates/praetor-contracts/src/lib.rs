//! # praetor-contracts
//!
//! Shared types and the error taxonomy for the PRAETOR governance engine.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions and error types.

pub mod audit;
pub mod error;
pub mod escalation;
pub mod exception;
pub mod request;
pub mod verdict;

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use error::PraetorError;
    use escalation::{CaseId, EscalationCase, EscalationStatus};
    use exception::{
        ExceptionId, ExceptionRequest, ExceptionStatus, RiskLevel, Tier,
    };
    use request::{EvaluationRequest, RequestMetadata, ResourceDescriptor};
    use verdict::Verdict;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn make_exception(status: ExceptionStatus, duration_secs: i64) -> ExceptionRequest {
        ExceptionRequest {
            id: ExceptionId::new(),
            policy_id: "infra-baseline".to_string(),
            resource: ResourceDescriptor::new("storage_bucket", "logs-eu"),
            requester: "alice".to_string(),
            justification: "migration window".to_string(),
            mitigation: "bucket remains private".to_string(),
            requested_duration_secs: duration_secs,
            risk_level: RiskLevel::Medium,
            tier: Tier::ManagedException,
            status,
            assigned_reviewers: vec!["security-lead".to_string()],
            approvals: vec![],
            approved_at: None,
            denial_reason: None,
            created_at: Utc::now(),
        }
    }

    // ── ExceptionStatus terminality ──────────────────────────────────────────

    #[test]
    fn terminal_statuses_are_terminal() {
        assert!(ExceptionStatus::Denied.is_terminal());
        assert!(ExceptionStatus::Expired.is_terminal());
        assert!(ExceptionStatus::Withdrawn.is_terminal());
        assert!(!ExceptionStatus::PendingReview.is_terminal());
        assert!(!ExceptionStatus::Approved.is_terminal());
    }

    // ── Time-derived expiry ──────────────────────────────────────────────────

    #[test]
    fn expiry_is_derived_from_approved_at_plus_duration() {
        let mut exc = make_exception(ExceptionStatus::Approved, 4 * 3600);
        let approved_at = Utc::now();
        exc.approved_at = Some(approved_at);

        // One second inside the window: active.
        let inside = approved_at + Duration::seconds(4 * 3600 - 1);
        assert!(!exc.is_time_expired(inside));
        assert!(exc.is_active(inside));

        // One second past the window: expired, even though the stored
        // status has not been swept yet.
        let past = approved_at + Duration::seconds(4 * 3600 + 1);
        assert!(exc.is_time_expired(past));
        assert!(!exc.is_active(past));
    }

    #[test]
    fn pending_exception_is_never_time_expired() {
        let exc = make_exception(ExceptionStatus::PendingReview, 60);
        assert!(!exc.is_time_expired(Utc::now() + Duration::days(365)));
        assert!(!exc.is_active(Utc::now()));
    }

    // ── Tier numbering ───────────────────────────────────────────────────────

    #[test]
    fn tier_numbers_match_governance_convention() {
        assert_eq!(Tier::Automated.number(), 1);
        assert_eq!(Tier::ManagedException.number(), 2);
        assert_eq!(Tier::EthicsEscalation.number(), 3);
    }

    // ── Verdict serde ────────────────────────────────────────────────────────

    #[test]
    fn verdict_round_trips_as_snake_case() {
        for (verdict, expected) in [
            (Verdict::Allow, "\"allow\""),
            (Verdict::Deny, "\"deny\""),
            (Verdict::RequireApproval, "\"require_approval\""),
        ] {
            let json = serde_json::to_string(&verdict).unwrap();
            assert_eq!(json, expected);
            let decoded: Verdict = serde_json::from_str(&json).unwrap();
            assert_eq!(decoded, verdict);
        }
    }

    // ── Request facts flattening ─────────────────────────────────────────────

    #[test]
    fn facts_exposes_fixed_fields_and_attributes() {
        let mut attributes = serde_json::Map::new();
        attributes.insert("encryption".to_string(), serde_json::Value::Null);

        let request = EvaluationRequest {
            actor: "ci-pipeline".to_string(),
            action: "create".to_string(),
            resource: ResourceDescriptor::new("storage_bucket", "raw-events"),
            namespaces: vec![],
            attributes,
            metadata: RequestMetadata::default(),
        };

        let facts = request.facts();
        assert_eq!(facts["actor"], "ci-pipeline");
        assert_eq!(facts["action"], "create");
        assert_eq!(facts["resource"]["kind"], "storage_bucket");
        assert!(facts["encryption"].is_null());
    }

    // ── Escalation case age ──────────────────────────────────────────────────

    #[test]
    fn case_age_uses_resolution_time_once_resolved() {
        let opened = Utc::now();
        let mut case = EscalationCase {
            id: CaseId::new(),
            description: "BCI telemetry retention".to_string(),
            concerns: vec!["informed consent".to_string()],
            status: EscalationStatus::Open,
            outcome: None,
            opened_at: opened,
            resolved_at: None,
        };

        let later = opened + Duration::hours(6);
        assert_eq!(case.age(later), Duration::hours(6));

        case.status = EscalationStatus::Resolved;
        case.resolved_at = Some(opened + Duration::hours(2));
        // Age freezes at resolution.
        assert_eq!(case.age(later), Duration::hours(2));
    }

    // ── Error display messages ───────────────────────────────────────────────

    #[test]
    fn error_display_carries_context() {
        let err = PraetorError::PolicyNotFound {
            policy_id: "infra-baseline".to_string(),
            version: Some("v3".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("infra-baseline"));
        assert!(msg.contains("v3"));

        let err = PraetorError::Conflict {
            reason: "status is approved, expected pending_review".to_string(),
        };
        assert!(err.to_string().contains("conflicting state transition"));

        let err = PraetorError::LoadRejected {
            reason: "predicate reference cycle: a -> b -> a".to_string(),
        };
        assert!(err.to_string().contains("policy load rejected"));
    }

    // ── Id uniqueness ────────────────────────────────────────────────────────

    #[test]
    fn exception_ids_are_unique() {
        let ids: std::collections::HashSet<String> =
            (0..100).map(|_| ExceptionId::new().to_string()).collect();
        assert_eq!(ids.len(), 100);
    }
}
