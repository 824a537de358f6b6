//! The four PRAETOR demo scenarios.
//!
//! Each scenario wires real components — versioned policy store, store
//! evaluator, hash-chained audit log, governance engine — around a
//! steppable clock, runs a governance flow end to end, and prints what
//! happened.  The audit chain is verified at the end of every scenario.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use praetor_audit::InMemoryAuditLog;
use praetor_contracts::{
    audit::DecisionPayload,
    error::PraetorResult,
    escalation::ResolutionOutcome,
    exception::ReviewDecision,
    request::{EvaluationRequest, RequestMetadata, ResourceDescriptor, SensitivityClass},
    verdict::Verdict,
};
use praetor_core::{
    config::GovernanceConfig,
    traits::{AuditSink, Clock, NullNotifier, StaticReviewerDirectory},
};
use praetor_governance::{Engine, ExceptionSubmission};
use praetor_metrics::Timeframe;
use praetor_policy::{PolicySet, PolicyStore, StoreEvaluator};

const BASELINE_POLICY: &str = r#"
    policy_id = "infra-baseline"
    version = "v1"

    [[rules]]
    id = "deny-unencrypted-bucket"
    namespace = "storage"
    description = "Buckets must declare server-side encryption"
    kind = "deny"
    message = "storage bucket is missing server-side encryption"

    [rules.predicate]
    type = "all"

    [[rules.predicate.preds]]
    type = "compare"
    field = "resource.kind"
    op = "eq"
    value = "storage_bucket"

    [[rules.predicate.preds]]
    type = "absent"
    field = "encryption"

    [[rules]]
    id = "allow-encrypted-bucket"
    namespace = "storage"
    description = "Encrypted buckets may be created"
    kind = "allow"
    auto_approve = true

    [rules.predicate]
    type = "all"

    [[rules.predicate.preds]]
    type = "compare"
    field = "resource.kind"
    op = "eq"
    value = "storage_bucket"

    [[rules.predicate.preds]]
    type = "present"
    field = "encryption"

    [[rules]]
    id = "approval-for-public-access"
    namespace = "storage"
    description = "Public bucket ACLs need human sign-off"
    kind = "require-approval"
    message = "public bucket access requires approval"

    [rules.predicate]
    type = "compare"
    field = "acl"
    op = "eq"
    value = "public-read"
"#;

const CYCLIC_POLICY: &str = r#"
    policy_id = "broken"
    version = "v1"

    [[rules]]
    id = "a"
    namespace = "storage"
    description = "references b"
    kind = "deny"
    message = "a"

    [rules.predicate]
    type = "ref"
    rule_id = "b"

    [[rules]]
    id = "b"
    namespace = "storage"
    description = "references a"
    kind = "deny"
    message = "b"

    [rules.predicate]
    type = "ref"
    rule_id = "a"
"#;

const GOVERNANCE_CONFIG: &str = r#"
    [risk]
    medium_threshold = 30
    high_threshold = 60

    [quorum]
    low = 1
    medium = 2
    high = 3

    [reviewers]
    low = ["security-lead"]
    medium = ["security-lead", "legal-team"]
    high = ["ethics-board-1", "ethics-board-2", "ethics-board-3"]

    [metrics]
    retention_hours = 168
"#;

// ── Harness ───────────────────────────────────────────────────────────────────

/// A clock the demo can step forward to show expiry without sleeping.
#[derive(Clone)]
struct SteppableClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl SteppableClock {
    fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Utc::now())),
        }
    }

    fn advance(&self, by: Duration) {
        *self.now.lock().expect("clock lock poisoned") += by;
    }
}

impl Clock for SteppableClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}

struct Harness {
    engine: Engine,
    audit: Arc<InMemoryAuditLog>,
    clock: SteppableClock,
}

/// Publish the baseline policy, audit the publication, and wire the
/// engine.
fn harness() -> PraetorResult<Harness> {
    let store = Arc::new(PolicyStore::new());
    let audit = Arc::new(InMemoryAuditLog::new());
    let clock = SteppableClock::new();

    let set = PolicySet::from_toml_str(BASELINE_POLICY)?;
    let published = store.publish(set)?;
    audit.append(
        "policy-admin",
        DecisionPayload::PolicyPublished {
            policy_id: published.policy_id.clone(),
            version: published.version.clone(),
            rule_count: published.rules.len(),
        },
        &serde_json::json!({ "source": "baseline policy document" }),
    )?;

    let config = GovernanceConfig::from_toml_str(GOVERNANCE_CONFIG)?;
    let directory = StaticReviewerDirectory::new(
        config.reviewers.low.clone(),
        config.reviewers.medium.clone(),
        config.reviewers.high.clone(),
    );

    let engine = Engine::new(
        Box::new(StoreEvaluator::new(store)),
        audit.clone(),
        Box::new(directory),
        Box::new(NullNotifier),
        Box::new(clock.clone()),
        config,
    );
    Ok(Harness {
        engine,
        audit,
        clock,
    })
}

fn bucket_request(name: &str, attributes: serde_json::Value) -> EvaluationRequest {
    let attributes = match attributes {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    EvaluationRequest {
        actor: "ci-pipeline".to_string(),
        action: "create".to_string(),
        resource: ResourceDescriptor::new("storage_bucket", name),
        namespaces: vec![],
        attributes,
        metadata: RequestMetadata {
            sensitivity: SensitivityClass::Internal,
            blast_radius: 1,
            requested_duration_secs: Some(4 * 3600),
            prior_violations: 0,
        },
    }
}

fn policies() -> Vec<String> {
    vec!["infra-baseline".to_string()]
}

fn finish(harness: &Harness) {
    let chain_ok = harness.audit.verify_integrity();
    println!(
        "  audit: {} records, chain {}",
        harness.audit.len(),
        if chain_ok { "VALID" } else { "BROKEN" }
    );
    println!();
}

// ── Scenario 1: evaluation and load rejection ─────────────────────────────────

/// Fail-closed evaluation: denied, allowed, and require-approval verdicts,
/// plus load-time rejection of a cyclic policy document.
pub fn evaluation() -> PraetorResult<()> {
    println!("Scenario 1 — Policy evaluation");
    let h = harness()?;

    let denied = h.engine.evaluate(
        &policies(),
        &bucket_request("logs-eu", serde_json::json!({ "encryption": null })),
    )?;
    println!("  unencrypted bucket      → {:?} ({})", denied.verdict, denied.violations[0]);

    let allowed = h.engine.evaluate(
        &policies(),
        &bucket_request("logs-eu", serde_json::json!({ "encryption": { "algorithm": "aes256" } })),
    )?;
    println!("  encrypted bucket        → {:?}", allowed.verdict);

    let approval = h.engine.evaluate(
        &policies(),
        &bucket_request(
            "assets-public",
            serde_json::json!({ "encryption": { "algorithm": "aes256" }, "acl": "public-read" }),
        ),
    )?;
    println!("  public-read bucket      → {:?}", approval.verdict);
    assert_eq!(approval.verdict, Verdict::RequireApproval);

    // A cyclic predicate graph is rejected at load, never at evaluation.
    match PolicySet::from_toml_str(CYCLIC_POLICY) {
        Err(e) => {
            println!("  cyclic policy document  → rejected: {e}");
            h.audit.append(
                "policy-admin",
                DecisionPayload::PolicyLoadRejected {
                    policy_id: "broken".to_string(),
                    reason: e.to_string(),
                },
                &serde_json::json!({ "source": "cyclic policy document" }),
            )?;
        }
        Ok(_) => println!("  cyclic policy document  → unexpectedly accepted"),
    }

    finish(&h);
    Ok(())
}

// ── Scenario 2: exception lifecycle ───────────────────────────────────────────

/// A denied change is overridden by a quorum-approved exception, then the
/// deny returns once the exception's validity window elapses.
pub fn exception_lifecycle() -> PraetorResult<()> {
    println!("Scenario 2 — Exception lifecycle");
    let h = harness()?;
    let request = bucket_request("legacy-import", serde_json::json!({ "encryption": null }));

    let denied = h.engine.evaluate(&policies(), &request)?;
    println!("  initial evaluation      → {:?}", denied.verdict);

    let outcome = h.engine.submit_exception(ExceptionSubmission {
        policy_id: "infra-baseline".to_string(),
        resource: request.resource.clone(),
        requester: "alice".to_string(),
        justification: "legacy importer cannot write encrypted buckets until Q3".to_string(),
        mitigation: "bucket access restricted to the importer service account".to_string(),
        requested_duration_secs: 4 * 3600,
        metadata: RequestMetadata {
            sensitivity: SensitivityClass::Confidential,
            blast_radius: 5,
            ..RequestMetadata::default()
        },
    })?;
    let id = outcome.request.id;
    println!(
        "  exception submitted     → tier {}, reviewers {:?}",
        outcome.request.tier.number(),
        outcome.request.assigned_reviewers
    );

    let status = h
        .engine
        .review_exception(id, "security-lead", ReviewDecision::Approve, None)?;
    println!("  first approval          → {:?}", status);
    let status = h
        .engine
        .review_exception(id, "legal-team", ReviewDecision::Approve, None)?;
    println!("  second approval         → {:?} (quorum reached)", status);

    let overridden = h.engine.evaluate(&policies(), &request)?;
    println!(
        "  evaluation under grant  → {:?} (exception {})",
        overridden.verdict,
        overridden.exception_override.map(|id| id.to_string()).unwrap_or_default()
    );

    h.clock.advance(Duration::hours(4) + Duration::seconds(1));
    let expired = h.engine.get_exception(id)?;
    println!("  4h 1s later             → exception {:?}", expired.status);

    let reverted = h.engine.evaluate(&policies(), &request)?;
    println!("  evaluation after expiry → {:?}", reverted.verdict);

    finish(&h);
    Ok(())
}

// ── Scenario 3: ethics escalation ─────────────────────────────────────────────

/// A high-risk submission opens a linked escalation case, which the board
/// deliberates and resolves.
pub fn escalation() -> PraetorResult<()> {
    println!("Scenario 3 — Ethics escalation");
    let h = harness()?;

    let outcome = h.engine.submit_exception(ExceptionSubmission {
        policy_id: "infra-baseline".to_string(),
        resource: ResourceDescriptor::new("storage_bucket", "user-archive"),
        requester: "bob".to_string(),
        justification: "bulk deletion of user archives past retention".to_string(),
        mitigation: "deletion gated on a reviewed manifest".to_string(),
        requested_duration_secs: 24 * 3600,
        metadata: RequestMetadata {
            sensitivity: SensitivityClass::Restricted,
            blast_radius: 20,
            ..RequestMetadata::default()
        },
    })?;
    let Some(case) = outcome.case else {
        println!("  no escalation case was opened; nothing to deliberate");
        return Ok(());
    };
    println!(
        "  exception submitted     → tier {}, case {}",
        outcome.request.tier.number(),
        case.id
    );

    h.clock.advance(Duration::hours(6));
    let ages = h.engine.open_case_ages();
    println!("  open case age           → {}h", ages[0].1.num_hours());

    h.engine.begin_deliberation("ethics-board-1", case.id)?;
    let resolved = h.engine.resolve_escalation(
        "ethics-board-1",
        case.id,
        ResolutionOutcome::PolicyAmendmentRequired,
    )?;
    println!(
        "  board resolution        → {:?} ({:?})",
        resolved.status, resolved.outcome
    );

    finish(&h);
    Ok(())
}

// ── Scenario 4: metrics ───────────────────────────────────────────────────────

/// A mixed flow of evaluations and reviews, summarized through the
/// windowed metrics query.
pub fn metrics() -> PraetorResult<()> {
    println!("Scenario 4 — Windowed metrics");
    let h = harness()?;

    for i in 0..3 {
        h.engine.evaluate(
            &policies(),
            &bucket_request(
                &format!("bucket-{i}"),
                serde_json::json!({ "encryption": { "algorithm": "aes256" } }),
            ),
        )?;
    }
    let request = bucket_request("legacy", serde_json::json!({ "encryption": null }));
    h.engine.evaluate(&policies(), &request)?;

    h.clock.advance(Duration::minutes(20));
    let id = h
        .engine
        .submit_exception(ExceptionSubmission {
            policy_id: "infra-baseline".to_string(),
            resource: request.resource.clone(),
            requester: "alice".to_string(),
            justification: "remediation in progress".to_string(),
            mitigation: "read access removed meanwhile".to_string(),
            requested_duration_secs: 3600,
            metadata: RequestMetadata {
                sensitivity: SensitivityClass::Confidential,
                blast_radius: 5,
                ..RequestMetadata::default()
            },
        })?
        .request
        .id;
    h.engine
        .review_exception(id, "security-lead", ReviewDecision::Approve, None)?;
    h.engine
        .review_exception(id, "legal-team", ReviewDecision::Approve, None)?;

    let report = h.engine.get_metrics(Timeframe::LastDay)?;
    println!("  evaluations             → {}", report.evaluations);
    println!("  denials                 → {}", report.denials);
    println!("  violation rate          → {:.2}", report.violation_rate);
    println!(
        "  tier-2 approval rate    → {}",
        report
            .tier2_approval_rate
            .map(|r| format!("{r:.2}"))
            .unwrap_or_else(|| "n/a".to_string())
    );
    println!(
        "  mean time to remediate  → {}",
        report
            .mean_time_to_remediate_secs
            .map(|s| format!("{}s", s as i64))
            .unwrap_or_else(|| "n/a".to_string())
    );

    finish(&h);
    Ok(())
}
