//! Versioned, copy-on-write policy store.
//!
//! Published sets are held behind `Arc` and never mutated: an update
//! publishes a new version and swaps the "current" pointer under a short
//! write lock.  Readers clone the `Arc` and evaluate against a fully
//! consistent set — they never block on writers and never observe a
//! partially-updated rule set.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::info;

use praetor_contracts::error::{PraetorError, PraetorResult};

use crate::set::PolicySet;

/// All published versions of one policy id, in publication order.
///
/// The last entry is the current version.
struct PolicyHistory {
    versions: Vec<Arc<PolicySet>>,
}

/// The policy store: immutable versioned sets keyed by policy id.
#[derive(Default)]
pub struct PolicyStore {
    inner: RwLock<HashMap<String, PolicyHistory>>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a validated set as the new current version of its policy id.
    ///
    /// Re-runs validation (publication is the load boundary) and rejects a
    /// version identifier that was already published for the same id —
    /// published versions are immutable.
    pub fn publish(&self, set: PolicySet) -> PraetorResult<Arc<PolicySet>> {
        set.validate()?;

        let mut inner = self.inner.write().expect("policy store lock poisoned");
        let history = inner
            .entry(set.policy_id.clone())
            .or_insert_with(|| PolicyHistory { versions: vec![] });

        if history.versions.iter().any(|v| v.version == set.version) {
            return Err(PraetorError::LoadRejected {
                reason: format!(
                    "policy '{}' version '{}' is already published and immutable",
                    set.policy_id, set.version
                ),
            });
        }

        info!(
            policy_id = %set.policy_id,
            version = %set.version,
            rule_count = set.rules.len(),
            "policy set published"
        );

        let arc = Arc::new(set);
        history.versions.push(arc.clone());
        Ok(arc)
    }

    /// The current (most recently published) version of a policy id.
    pub fn current(&self, policy_id: &str) -> PraetorResult<Arc<PolicySet>> {
        let inner = self.inner.read().expect("policy store lock poisoned");
        inner
            .get(policy_id)
            .and_then(|h| h.versions.last().cloned())
            .ok_or_else(|| PraetorError::PolicyNotFound {
                policy_id: policy_id.to_string(),
                version: None,
            })
    }

    /// A specific published version of a policy id, for reproducing past
    /// evaluations.
    pub fn version(&self, policy_id: &str, version: &str) -> PraetorResult<Arc<PolicySet>> {
        let inner = self.inner.read().expect("policy store lock poisoned");
        inner
            .get(policy_id)
            .and_then(|h| h.versions.iter().find(|v| v.version == version).cloned())
            .ok_or_else(|| PraetorError::PolicyNotFound {
                policy_id: policy_id.to_string(),
                version: Some(version.to_string()),
            })
    }
}
