//! Evaluation request types.
//!
//! An `EvaluationRequest` describes a proposed change — typically an
//! infrastructure mutation — as structured attributes.  The engine never
//! interprets the attributes itself; policy rule predicates reference them
//! by dot-notation field path.

use serde::{Deserialize, Serialize};

/// Sensitivity classification of the resource a request touches.
///
/// Ordered from least to most sensitive; the risk classifier weights
/// higher classes more heavily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityClass {
    Public,
    Internal,
    Confidential,
    Restricted,
}

/// The resource a proposed change targets.
///
/// `kind` is the coarse type (e.g. `"storage_bucket"`, `"iam_role"`);
/// `name` identifies the concrete instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub kind: String,
    pub name: String,
}

impl ResourceDescriptor {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

/// Risk-relevant metadata accompanying an evaluation request.
///
/// Consumed by the risk classifier when a verdict requires approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMetadata {
    /// Sensitivity class of the targeted resource.
    pub sensitivity: SensitivityClass,

    /// Number of resources affected by the change.
    #[serde(default)]
    pub blast_radius: u32,

    /// How long the requested change (or exception) should stand, in seconds.
    #[serde(default)]
    pub requested_duration_secs: Option<i64>,

    /// The actor's prior-violation count, supplied by the identity provider.
    #[serde(default)]
    pub prior_violations: u32,
}

impl Default for RequestMetadata {
    fn default() -> Self {
        Self {
            sensitivity: SensitivityClass::Internal,
            blast_radius: 1,
            requested_duration_secs: None,
            prior_violations: 0,
        }
    }
}

/// A structured description of a proposed change, submitted for evaluation.
///
/// `attributes` is an open key-value map; rule predicates address it with
/// dot-notation paths (e.g. `"encryption.algorithm"`).  The fixed fields
/// `actor`, `action`, `resource.kind`, and `resource.name` are addressable
/// under the same namespace via [`EvaluationRequest::facts`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Who is requesting the change (identity-provider subject).
    pub actor: String,

    /// The requested action (e.g. `"create"`, `"delete"`, `"modify_acl"`).
    pub action: String,

    /// The resource the change targets.
    pub resource: ResourceDescriptor,

    /// Policy namespaces this request opts into.  Empty means "all
    /// namespaces in the consulted policy sets".
    #[serde(default)]
    pub namespaces: Vec<String>,

    /// Arbitrary structured attributes describing the change.
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,

    /// Risk-relevant metadata for governance routing.
    #[serde(default)]
    pub metadata: RequestMetadata,
}

impl EvaluationRequest {
    /// Flatten the request into a single JSON object for predicate lookup.
    ///
    /// The fixed fields are exposed as `actor`, `action`, `resource.kind`
    /// and `resource.name`; everything in `attributes` is merged at the top
    /// level.  An attribute named like a fixed field shadows it.
    pub fn facts(&self) -> serde_json::Value {
        let mut facts = serde_json::Map::new();
        facts.insert("actor".to_string(), self.actor.clone().into());
        facts.insert("action".to_string(), self.action.clone().into());
        facts.insert(
            "resource".to_string(),
            serde_json::json!({
                "kind": self.resource.kind,
                "name": self.resource.name,
            }),
        );
        for (key, value) in &self.attributes {
            facts.insert(key.clone(), value.clone());
        }
        serde_json::Value::Object(facts)
    }
}
