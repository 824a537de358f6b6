//! The fail-closed rule evaluator.
//!
//! Evaluation algorithm:
//!
//! 1. Resolve the current version of every named policy set; an unknown id
//!    fails the whole evaluation with `PolicyNotFound` — no partial result.
//! 2. Flatten the request into facts and evaluate every rule in the
//!    namespaces the request references, using three-valued logic.
//!    Undefined (absent attribute) counts as a non-match and is recorded
//!    as a warning.
//! 3. Resolve the verdict commutatively, independent of evaluation order:
//!    any deny match → Deny (all deny messages aggregated); else any
//!    require-approval match → RequireApproval; else any allow match →
//!    Allow; else → Deny (fail-closed: absence of explicit allow is not
//!    permission).
//!
//! The matched-rule list preserves declaration order for audit
//! readability, independent of the resolution above.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use praetor_contracts::{
    error::PraetorResult,
    request::{EvaluationRequest, ResourceDescriptor},
    verdict::{EvaluationResult, PolicyRef, RuleMatch, Verdict},
};
use praetor_core::traits::PolicyEvaluator;

use crate::{predicate::Tri, rule::RuleKind, store::PolicyStore};

/// A `PolicyEvaluator` over a shared `PolicyStore`.
///
/// Stateless across calls: every evaluation pins the set versions it
/// consulted in the result, so identical (request, version) pairs always
/// reproduce the identical verdict and matched-rule set.
pub struct StoreEvaluator {
    store: Arc<PolicyStore>,
}

impl StoreEvaluator {
    pub fn new(store: Arc<PolicyStore>) -> Self {
        Self { store }
    }
}

impl PolicyEvaluator for StoreEvaluator {
    fn evaluate(
        &self,
        policy_ids: &[String],
        request: &EvaluationRequest,
    ) -> PraetorResult<EvaluationResult> {
        let started = Instant::now();

        // Resolve every set up front so an unknown id fails before any
        // rule runs.
        let mut sets = Vec::with_capacity(policy_ids.len());
        for id in policy_ids {
            sets.push(self.store.current(id)?);
        }

        debug!(
            actor = %request.actor,
            action = %request.action,
            resource_kind = %request.resource.kind,
            policy_count = sets.len(),
            "evaluating request"
        );

        let facts = request.facts();
        let mut matched: Vec<RuleMatch> = Vec::new();
        let mut violations: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        for set in &sets {
            let refs = set.predicate_index();
            for rule in &set.rules {
                if !request.namespaces.is_empty()
                    && !request.namespaces.contains(&rule.namespace)
                {
                    continue;
                }

                if rule.predicate.eval(&facts, &refs, &rule.id, &mut warnings) == Tri::True {
                    debug!(rule_id = %rule.id, kind = ?rule.kind, "rule matched");
                    matched.push(RuleMatch {
                        rule_id: rule.id.clone(),
                        kind: rule.kind.verdict(),
                    });
                    if rule.kind == RuleKind::Deny {
                        violations.push(
                            rule.message
                                .clone()
                                .unwrap_or_else(|| format!("denied by rule '{}'", rule.id)),
                        );
                    }
                }
            }
        }

        // Commutative resolution: the partition decides, never the order.
        let verdict = if matched.iter().any(|m| m.kind == Verdict::Deny) {
            Verdict::Deny
        } else if matched.iter().any(|m| m.kind == Verdict::RequireApproval) {
            Verdict::RequireApproval
        } else if matched.iter().any(|m| m.kind == Verdict::Allow) {
            Verdict::Allow
        } else {
            // Fail-closed default: nothing matched, so nothing permitted.
            warn!(
                actor = %request.actor,
                action = %request.action,
                resource = %format!("{}/{}", request.resource.kind, request.resource.name),
                "no rule matched; denying by default"
            );
            violations.push(format!(
                "denied by default: no policy rule matched action '{}' on resource '{}/{}'",
                request.action, request.resource.kind, request.resource.name
            ));
            Verdict::Deny
        };

        Ok(EvaluationResult {
            verdict,
            matched,
            violations,
            warnings,
            policies: sets
                .iter()
                .map(|s| PolicyRef {
                    policy_id: s.policy_id.clone(),
                    version: s.version.clone(),
                })
                .collect(),
            exception_override: None,
            elapsed_micros: started.elapsed().as_micros() as u64,
        })
    }

    /// Tier-1 automated approval is whitelisted when the current set has an
    /// `auto_approve` rule whose namespace covers the resource kind.
    fn auto_approval_whitelisted(
        &self,
        policy_id: &str,
        resource: &ResourceDescriptor,
    ) -> PraetorResult<bool> {
        let set = self.store.current(policy_id)?;
        Ok(set.rules.iter().any(|rule| {
            rule.auto_approve && (rule.namespace == "*" || rule.namespace == resource.kind)
        }))
    }
}
