//! # praetor-policy
//!
//! Versioned policy sets, predicate-tree rules, and the fail-closed
//! evaluator for the PRAETOR governance engine.
//!
//! ## Overview
//!
//! Policy documents are TOML; each declares an ordered list of rules whose
//! conditions are predicate expression trees (AND/OR/NOT, comparisons,
//! presence checks, references to other rules).  Sets are validated at
//! load — cyclic or over-deep predicate graphs are rejected before they
//! can ever be evaluated — and published immutably to a copy-on-write
//! [`PolicyStore`].
//!
//! Matched rules resolve commutatively: any deny match wins, then
//! require-approval, then allow, and a request matching nothing is denied
//! (fail-closed).
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use praetor_policy::{PolicySet, PolicyStore, StoreEvaluator};
//!
//! let store = Arc::new(PolicyStore::new());
//! store.publish(PolicySet::from_file(Path::new("policies/infra.toml"))?)?;
//! let evaluator = StoreEvaluator::new(store);
//! ```

pub mod evaluator;
pub mod predicate;
pub mod rule;
pub mod set;
pub mod store;

pub use evaluator::StoreEvaluator;
pub use predicate::{CmpOp, Predicate, Tri};
pub use rule::{PolicyDocument, PolicyRule, RuleKind};
pub use set::{PolicySet, MAX_PREDICATE_DEPTH};
pub use store::PolicyStore;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use praetor_contracts::{
        error::PraetorError,
        request::{EvaluationRequest, RequestMetadata, ResourceDescriptor},
        verdict::Verdict,
    };
    use praetor_core::traits::PolicyEvaluator;

    use crate::{PolicySet, PolicyStore, StoreEvaluator};

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// Publish a TOML document and wrap the store in an evaluator.
    fn evaluator_for(toml: &str) -> StoreEvaluator {
        let store = Arc::new(PolicyStore::new());
        store
            .publish(PolicySet::from_toml_str(toml).expect("test policy must load"))
            .expect("test policy must publish");
        StoreEvaluator::new(store)
    }

    /// Build a request with the given attributes as JSON.
    fn request(
        action: &str,
        resource_kind: &str,
        attributes: serde_json::Value,
    ) -> EvaluationRequest {
        let attributes = match attributes {
            serde_json::Value::Object(map) => map,
            other => panic!("attributes must be a JSON object, got {:?}", other),
        };
        EvaluationRequest {
            actor: "ci-pipeline".to_string(),
            action: action.to_string(),
            resource: ResourceDescriptor::new(resource_kind, "test-resource"),
            namespaces: vec![],
            attributes,
            metadata: RequestMetadata::default(),
        }
    }

    const BASELINE: &str = r#"
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
    "#;

    // ── 1. fail-closed default ────────────────────────────────────────────────

    /// With no rules at all, every request must be denied.
    #[test]
    fn test_fail_closed_default() {
        let evaluator = evaluator_for(
            r#"
            policy_id = "empty"
            version = "v1"
            rules = []
            "#,
        );

        let result = evaluator
            .evaluate(
                &["empty".to_string()],
                &request("create", "storage_bucket", serde_json::json!({})),
            )
            .unwrap();

        assert_eq!(result.verdict, Verdict::Deny);
        assert!(result.matched.is_empty());
        assert_eq!(result.violations.len(), 1);
        assert!(result.violations[0].contains("denied by default"));
    }

    // ── 2. missing-encryption deny (null attribute) ───────────────────────────

    /// A bucket with `encryption: null` hits the deny rule — null counts as
    /// absent — and produces exactly one violation message.
    #[test]
    fn test_deny_on_null_encryption() {
        let evaluator = evaluator_for(BASELINE);

        let result = evaluator
            .evaluate(
                &["infra-baseline".to_string()],
                &request(
                    "create",
                    "storage_bucket",
                    serde_json::json!({ "encryption": null }),
                ),
            )
            .unwrap();

        assert_eq!(result.verdict, Verdict::Deny);
        assert_eq!(result.violations.len(), 1);
        assert!(result.violations[0].contains("server-side encryption"));
        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.matched[0].rule_id, "deny-unencrypted-bucket");
    }

    /// The same bucket with encryption declared matches only the allow rule.
    #[test]
    fn test_allow_on_encrypted_bucket() {
        let evaluator = evaluator_for(BASELINE);

        let result = evaluator
            .evaluate(
                &["infra-baseline".to_string()],
                &request(
                    "create",
                    "storage_bucket",
                    serde_json::json!({ "encryption": { "algorithm": "AES256" } }),
                ),
            )
            .unwrap();

        assert_eq!(result.verdict, Verdict::Allow);
        assert!(result.violations.is_empty());
    }

    // ── 3. deny precedence over allow ─────────────────────────────────────────

    /// When both a deny-kind and an allow-kind rule match, the verdict is
    /// deny, regardless of declaration order.
    #[test]
    fn test_deny_precedence() {
        let toml = r#"
            policy_id = "precedence"
            version = "v1"

            [[rules]]
            id = "allow-everything"
            namespace = "storage"
            description = "Allow all"
            kind = "allow"

            [rules.predicate]
            type = "present"
            field = "actor"

            [[rules]]
            id = "deny-public-acl"
            namespace = "storage"
            description = "Public ACLs are forbidden"
            kind = "deny"
            message = "public ACLs are forbidden"

            [rules.predicate]
            type = "compare"
            field = "acl"
            op = "eq"
            value = "public"
        "#;
        let evaluator = evaluator_for(toml);

        let result = evaluator
            .evaluate(
                &["precedence".to_string()],
                &request("create", "storage_bucket", serde_json::json!({ "acl": "public" })),
            )
            .unwrap();

        assert_eq!(result.verdict, Verdict::Deny);
        // Both rules matched; declaration order is preserved in the list.
        assert_eq!(result.matched.len(), 2);
        assert_eq!(result.matched[0].rule_id, "allow-everything");
        assert_eq!(result.matched[1].rule_id, "deny-public-acl");
        assert_eq!(result.violations, vec!["public ACLs are forbidden".to_string()]);
    }

    // ── 4. require-approval sits between deny and allow ───────────────────────

    #[test]
    fn test_require_approval_beats_allow() {
        let toml = r#"
            policy_id = "approval"
            version = "v1"

            [[rules]]
            id = "allow-deletes"
            namespace = "storage"
            description = "Deletes are generally allowed"
            kind = "allow"

            [rules.predicate]
            type = "compare"
            field = "action"
            op = "eq"
            value = "delete"

            [[rules]]
            id = "review-large-deletes"
            namespace = "storage"
            description = "Large deletes need review"
            kind = "require-approval"
            message = "deleting more than 10 resources requires sign-off"

            [rules.predicate]
            type = "compare"
            field = "count"
            op = "gt"
            value = 10
        "#;
        let evaluator = evaluator_for(toml);

        let result = evaluator
            .evaluate(
                &["approval".to_string()],
                &request("delete", "storage_bucket", serde_json::json!({ "count": 25 })),
            )
            .unwrap();

        assert_eq!(result.verdict, Verdict::RequireApproval);
        assert!(result.violations.is_empty());
    }

    // ── 5. undefined attribute → warning, not error ───────────────────────────

    #[test]
    fn test_undefined_attribute_warns_and_does_not_match() {
        let toml = r#"
            policy_id = "warnings"
            version = "v1"

            [[rules]]
            id = "deny-large-radius"
            namespace = "infra"
            description = "Large blast radius is denied"
            kind = "deny"
            message = "blast radius too large"

            [rules.predicate]
            type = "compare"
            field = "blast_radius"
            op = "gt"
            value = 100
        "#;
        let evaluator = evaluator_for(toml);

        let result = evaluator
            .evaluate(
                &["warnings".to_string()],
                &request("create", "vm", serde_json::json!({})),
            )
            .unwrap();

        // The rule did not match (undefined), so we fall through to the
        // fail-closed default — but the gap is surfaced as a warning.
        assert_eq!(result.verdict, Verdict::Deny);
        assert!(result.violations[0].contains("denied by default"));
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("blast_radius"));
    }

    // ── 6. namespace restriction ──────────────────────────────────────────────

    #[test]
    fn test_namespace_restriction_skips_other_rules() {
        let toml = r#"
            policy_id = "namespaced"
            version = "v1"

            [[rules]]
            id = "deny-all-iam"
            namespace = "iam"
            description = "IAM changes are denied"
            kind = "deny"
            message = "iam changes are frozen"

            [rules.predicate]
            type = "present"
            field = "actor"

            [[rules]]
            id = "allow-storage"
            namespace = "storage"
            description = "Storage changes are allowed"
            kind = "allow"

            [rules.predicate]
            type = "present"
            field = "actor"
        "#;
        let evaluator = evaluator_for(toml);

        // Restricted to "storage": the iam deny rule is never evaluated.
        let mut req = request("create", "storage_bucket", serde_json::json!({}));
        req.namespaces = vec!["storage".to_string()];

        let result = evaluator.evaluate(&["namespaced".to_string()], &req).unwrap();
        assert_eq!(result.verdict, Verdict::Allow);
        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.matched[0].rule_id, "allow-storage");
    }

    // ── 7. determinism ────────────────────────────────────────────────────────

    /// Identical (request, policy version) pairs yield identical verdicts
    /// and matched-rule sets.
    #[test]
    fn test_determinism() {
        let evaluator = evaluator_for(BASELINE);
        let req = request(
            "create",
            "storage_bucket",
            serde_json::json!({ "encryption": null }),
        );

        let first = evaluator.evaluate(&["infra-baseline".to_string()], &req).unwrap();
        let second = evaluator.evaluate(&["infra-baseline".to_string()], &req).unwrap();

        assert_eq!(first.verdict, second.verdict);
        assert_eq!(first.matched, second.matched);
        assert_eq!(first.violations, second.violations);
        assert_eq!(first.policies, second.policies);
    }

    // ── 8. unknown policy fails the whole evaluation ──────────────────────────

    #[test]
    fn test_policy_not_found_fails_whole_evaluation() {
        let evaluator = evaluator_for(BASELINE);

        let result = evaluator.evaluate(
            &["infra-baseline".to_string(), "no-such-policy".to_string()],
            &request("create", "storage_bucket", serde_json::json!({})),
        );

        match result {
            Err(PraetorError::PolicyNotFound { policy_id, .. }) => {
                assert_eq!(policy_id, "no-such-policy");
            }
            other => panic!("expected PolicyNotFound, got {:?}", other),
        }
    }

    // ── 9. load rejection: reference cycle ────────────────────────────────────

    #[test]
    fn test_load_rejects_reference_cycle() {
        let toml = r#"
            policy_id = "cyclic"
            version = "v1"

            [[rules]]
            id = "a"
            namespace = "infra"
            description = "references b"
            kind = "allow"

            [rules.predicate]
            type = "ref"
            rule_id = "b"

            [[rules]]
            id = "b"
            namespace = "infra"
            description = "references a"
            kind = "allow"

            [rules.predicate]
            type = "ref"
            rule_id = "a"
        "#;

        match PolicySet::from_toml_str(toml) {
            Err(PraetorError::LoadRejected { reason }) => {
                assert!(reason.contains("cycle"), "unexpected reason: {reason}");
            }
            other => panic!("expected LoadRejected, got {:?}", other),
        }
    }

    // ── 10. load rejection: over-deep predicate ───────────────────────────────

    #[test]
    fn test_load_rejects_over_deep_predicate() {
        // A Not-chain nested past MAX_PREDICATE_DEPTH, built programmatically.
        use crate::{predicate::Predicate, rule::{PolicyDocument, PolicyRule, RuleKind}};
        let mut pred = Predicate::Present {
            field: "actor".to_string(),
        };
        for _ in 0..40 {
            pred = Predicate::Not { pred: Box::new(pred) };
        }
        let doc = PolicyDocument {
            policy_id: "deep".to_string(),
            version: "v1".to_string(),
            rules: vec![PolicyRule {
                id: "deep-rule".to_string(),
                namespace: "infra".to_string(),
                description: "too deep".to_string(),
                kind: RuleKind::Allow,
                predicate: pred,
                message: None,
                auto_approve: false,
            }],
        };

        match PolicySet::from_document(doc) {
            Err(PraetorError::LoadRejected { reason }) => {
                assert!(reason.contains("depth"), "unexpected reason: {reason}");
            }
            other => panic!("expected LoadRejected, got {:?}", other),
        }
    }

    // ── 11. load rejection: deny without message ──────────────────────────────

    #[test]
    fn test_load_rejects_deny_without_message() {
        let toml = r#"
            policy_id = "no-message"
            version = "v1"

            [[rules]]
            id = "silent-deny"
            namespace = "infra"
            description = "deny with no message"
            kind = "deny"

            [rules.predicate]
            type = "present"
            field = "actor"
        "#;

        match PolicySet::from_toml_str(toml) {
            Err(PraetorError::LoadRejected { reason }) => {
                assert!(reason.contains("no message"), "unexpected reason: {reason}");
            }
            other => panic!("expected LoadRejected, got {:?}", other),
        }
    }

    // ── 12. store versioning ──────────────────────────────────────────────────

    #[test]
    fn test_store_versioning_is_copy_on_write() {
        let store = Arc::new(PolicyStore::new());
        let v1 = store
            .publish(PolicySet::from_toml_str(BASELINE).unwrap())
            .unwrap();

        // A reader holding v1 keeps a consistent set across publication.
        let v2_toml = BASELINE.replace("version = \"v1\"", "version = \"v2\"");
        store
            .publish(PolicySet::from_toml_str(&v2_toml).unwrap())
            .unwrap();

        assert_eq!(v1.version, "v1");
        assert_eq!(store.current("infra-baseline").unwrap().version, "v2");
        assert_eq!(
            store.version("infra-baseline", "v1").unwrap().version,
            "v1"
        );
    }

    #[test]
    fn test_store_rejects_republishing_a_version() {
        let store = PolicyStore::new();
        store
            .publish(PolicySet::from_toml_str(BASELINE).unwrap())
            .unwrap();

        match store.publish(PolicySet::from_toml_str(BASELINE).unwrap()) {
            Err(PraetorError::LoadRejected { reason }) => {
                assert!(reason.contains("immutable"), "unexpected reason: {reason}");
            }
            other => panic!("expected LoadRejected, got {:?}", other),
        }
    }

    // ── 13. auto-approval whitelist ───────────────────────────────────────────

    #[test]
    fn test_auto_approval_whitelist_follows_namespace() {
        let toml = r#"
            policy_id = "whitelist"
            version = "v1"

            [[rules]]
            id = "allow-tagged-vm"
            namespace = "compute"
            description = "Tagged VM changes may auto-approve at low risk"
            kind = "allow"
            auto_approve = true

            [rules.predicate]
            type = "present"
            field = "tags"
        "#;
        let evaluator = evaluator_for(toml);

        let vm = ResourceDescriptor::new("compute", "vm-1");
        assert!(evaluator.auto_approval_whitelisted("whitelist", &vm).unwrap());

        let bucket = ResourceDescriptor::new("storage_bucket", "b-1");
        assert!(!evaluator
            .auto_approval_whitelisted("whitelist", &bucket)
            .unwrap());
    }
}
