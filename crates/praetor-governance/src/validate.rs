//! Structural validation of incoming evaluation requests.
//!
//! Requests are checked against an embedded JSON Schema before any rule is
//! consulted.  Missing required fields are never defaulted; a malformed
//! request is rejected with `Validation` and audited as an evaluation
//! failure.

use std::sync::OnceLock;

use serde_json::{json, Value};
use tracing::warn;

use praetor_contracts::error::{PraetorError, PraetorResult};

fn request_schema() -> &'static Value {
    static SCHEMA: OnceLock<Value> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        json!({
            "type": "object",
            "required": ["actor", "action", "resource"],
            "properties": {
                "actor": { "type": "string", "minLength": 1 },
                "action": { "type": "string", "minLength": 1 },
                "resource": {
                    "type": "object",
                    "required": ["kind", "name"],
                    "properties": {
                        "kind": { "type": "string", "minLength": 1 },
                        "name": { "type": "string", "minLength": 1 }
                    }
                },
                "namespaces": {
                    "type": "array",
                    "items": { "type": "string" }
                },
                "attributes": { "type": "object" },
                "metadata": {
                    "type": "object",
                    "properties": {
                        "sensitivity": {
                            "enum": ["public", "internal", "confidential", "restricted"]
                        },
                        "blast_radius": { "type": "integer", "minimum": 0 },
                        "requested_duration_secs": {
                            "type": ["integer", "null"],
                            "minimum": 0
                        },
                        "prior_violations": { "type": "integer", "minimum": 0 }
                    }
                }
            }
        })
    })
}

/// Validate the JSON form of an evaluation request.
///
/// All schema violations are accumulated into one `Validation` error so
/// the caller sees the full picture rather than only the first failure.
pub fn validate_request(request: &Value) -> PraetorResult<()> {
    let validator =
        jsonschema::validator_for(request_schema()).map_err(|e| PraetorError::ConfigError {
            reason: format!("invalid embedded request schema: {e}"),
        })?;

    let messages: Vec<String> = validator
        .iter_errors(request)
        .map(|error| format!("{} at {}", error, error.instance_path))
        .collect();

    if messages.is_empty() {
        Ok(())
    } else {
        warn!(failures = messages.len(), "request failed structural validation");
        Err(PraetorError::Validation {
            reason: messages.join("; "),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use praetor_contracts::error::PraetorError;

    use super::validate_request;

    #[test]
    fn test_well_formed_request_passes() {
        let request = json!({
            "actor": "ci-pipeline",
            "action": "create",
            "resource": { "kind": "storage_bucket", "name": "logs-eu" },
            "attributes": { "encryption": { "algorithm": "aes256" } },
            "metadata": { "sensitivity": "internal", "blast_radius": 1 }
        });
        assert!(validate_request(&request).is_ok());
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let request = json!({
            "actor": "ci-pipeline",
            "resource": { "kind": "storage_bucket", "name": "logs-eu" }
        });
        let err = validate_request(&request).unwrap_err();
        match err {
            PraetorError::Validation { reason } => {
                assert!(reason.contains("action"), "reason was: {reason}")
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_failures_accumulated() {
        let request = json!({
            "actor": "",
            "action": "create",
            "resource": { "kind": "storage_bucket" }
        });
        let err = validate_request(&request).unwrap_err();
        match err {
            PraetorError::Validation { reason } => {
                assert!(reason.contains(';'), "expected both failures, got: {reason}")
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_sensitivity_rejected() {
        let request = json!({
            "actor": "a",
            "action": "create",
            "resource": { "kind": "k", "name": "n" },
            "metadata": { "sensitivity": "radioactive" }
        });
        assert!(validate_request(&request).is_err());
    }
}
