//! Immutable, versioned policy sets and load-time validation.
//!
//! A `PolicySet` is built from a `PolicyDocument` and validated before it
//! can be published: duplicate rule ids, dangling or cyclic `Ref` edges,
//! over-deep predicate trees, and deny/require-approval rules without a
//! message are all rejected at load — never at evaluation — so evaluation
//! latency stays bounded and predictable.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use praetor_contracts::error::{PraetorError, PraetorResult};

use crate::{
    predicate::Predicate,
    rule::{PolicyDocument, PolicyRule, RuleKind},
};

/// Maximum effective predicate depth, counting `Ref` expansion.
pub const MAX_PREDICATE_DEPTH: usize = 32;

/// An ordered, immutable collection of policy rules at one version.
///
/// Once published to the store, a set is never mutated; updates publish a
/// new version and readers keep whatever `Arc` they already hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySet {
    pub policy_id: String,
    pub version: String,
    pub effective_at: DateTime<Utc>,
    pub rules: Vec<PolicyRule>,
}

impl PolicySet {
    /// Build a set from a parsed document and validate it.
    pub fn from_document(doc: PolicyDocument) -> PraetorResult<Self> {
        let set = Self {
            policy_id: doc.policy_id,
            version: doc.version,
            effective_at: Utc::now(),
            rules: doc.rules,
        };
        set.validate()?;
        debug!(
            policy_id = %set.policy_id,
            version = %set.version,
            rule_count = set.rules.len(),
            "policy set validated"
        );
        Ok(set)
    }

    /// Parse `s` as a TOML policy document and build a validated set.
    ///
    /// Returns `ConfigError` for malformed TOML and `LoadRejected` for
    /// semantic problems (cycles, depth, missing messages).
    pub fn from_toml_str(s: &str) -> PraetorResult<Self> {
        let doc: PolicyDocument = toml::from_str(s).map_err(|e| PraetorError::ConfigError {
            reason: format!("failed to parse policy TOML: {}", e),
        })?;
        Self::from_document(doc)
    }

    /// Read the file at `path` and parse it as a TOML policy document.
    pub fn from_file(path: &Path) -> PraetorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| PraetorError::ConfigError {
            reason: format!("failed to read policy file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Map of rule id → predicate, used for `Ref` resolution.
    pub fn predicate_index(&self) -> HashMap<&str, &Predicate> {
        self.rules
            .iter()
            .map(|r| (r.id.as_str(), &r.predicate))
            .collect()
    }

    /// Validate the set for publication.
    ///
    /// Checks, in order:
    /// 1. rule ids are unique
    /// 2. deny / require-approval rules carry a non-empty `message`
    /// 3. every `Ref` target exists
    /// 4. the `Ref` dependency graph is acyclic
    /// 5. the effective predicate depth (with `Ref` expansion) is bounded
    pub fn validate(&self) -> PraetorResult<()> {
        let mut by_id: HashMap<&str, &PolicyRule> = HashMap::new();
        for rule in &self.rules {
            if by_id.insert(rule.id.as_str(), rule).is_some() {
                return Err(PraetorError::LoadRejected {
                    reason: format!("duplicate rule id '{}'", rule.id),
                });
            }
        }

        for rule in &self.rules {
            if matches!(rule.kind, RuleKind::Deny | RuleKind::RequireApproval)
                && rule.message.as_deref().map_or(true, str::is_empty)
            {
                return Err(PraetorError::LoadRejected {
                    reason: format!(
                        "rule '{}' has kind '{:?}' but no message",
                        rule.id, rule.kind
                    ),
                });
            }

            for target in rule.predicate.referenced_rules() {
                if !by_id.contains_key(target) {
                    return Err(PraetorError::LoadRejected {
                        reason: format!(
                            "rule '{}' references unknown rule '{}'",
                            rule.id, target
                        ),
                    });
                }
            }
        }

        // Cycle and depth check over the Ref graph, memoized per rule.
        let mut depths: HashMap<&str, usize> = HashMap::new();
        for rule in &self.rules {
            let mut stack = Vec::new();
            let depth = effective_depth(rule.id.as_str(), &by_id, &mut depths, &mut stack)?;
            if depth > MAX_PREDICATE_DEPTH {
                return Err(PraetorError::LoadRejected {
                    reason: format!(
                        "rule '{}' has effective predicate depth {} (maximum {})",
                        rule.id, depth, MAX_PREDICATE_DEPTH
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Effective depth of a rule's predicate, expanding `Ref` edges.
///
/// `stack` holds the rule ids currently being expanded; revisiting one
/// means the dependency graph has a cycle.
fn effective_depth<'r>(
    rule_id: &'r str,
    by_id: &HashMap<&'r str, &'r PolicyRule>,
    memo: &mut HashMap<&'r str, usize>,
    stack: &mut Vec<&'r str>,
) -> PraetorResult<usize> {
    if let Some(&d) = memo.get(rule_id) {
        return Ok(d);
    }
    if stack.contains(&rule_id) {
        let start = stack.iter().position(|r| *r == rule_id).unwrap_or(0);
        let mut cycle: Vec<&str> = stack[start..].to_vec();
        cycle.push(rule_id);
        return Err(PraetorError::LoadRejected {
            reason: format!("predicate reference cycle: {}", cycle.join(" -> ")),
        });
    }

    stack.push(rule_id);
    let rule = by_id[rule_id];
    let depth = predicate_depth(&rule.predicate, by_id, memo, stack)?;
    stack.pop();

    memo.insert(rule_id, depth);
    Ok(depth)
}

fn predicate_depth<'r>(
    pred: &'r Predicate,
    by_id: &HashMap<&'r str, &'r PolicyRule>,
    memo: &mut HashMap<&'r str, usize>,
    stack: &mut Vec<&'r str>,
) -> PraetorResult<usize> {
    Ok(match pred {
        Predicate::All { preds } | Predicate::AnyOf { preds } => {
            let mut max = 0;
            for p in preds {
                max = max.max(predicate_depth(p, by_id, memo, stack)?);
            }
            1 + max
        }
        Predicate::Not { pred } => 1 + predicate_depth(pred, by_id, memo, stack)?,
        Predicate::Ref { rule_id } => {
            1 + effective_depth(rule_id.as_str(), by_id, memo, stack)?
        }
        Predicate::Compare { .. } | Predicate::Present { .. } | Predicate::Absent { .. } => 1,
    })
}
