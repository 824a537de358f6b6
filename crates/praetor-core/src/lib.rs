//! # praetor-core
//!
//! Trait seams and governance configuration for the PRAETOR engine.
//!
//! This crate provides:
//! - The collaborator traits (`PolicyEvaluator`, `AuditSink`,
//!   `ReviewerDirectory`, `Notifier`, `Clock`)
//! - `GovernanceConfig`, the explicit three-tier configuration object
//!   injected into the engine at construction

pub mod config;
pub mod traits;

pub use config::{GovernanceConfig, MetricsConfig, QuorumConfig, ReviewerPools, RiskThresholds};
pub use traits::{
    AuditSink, Clock, Notifier, NullNotifier, PolicyEvaluator, ReviewerDirectory,
    StaticReviewerDirectory, SystemClock,
};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use praetor_contracts::{
        error::PraetorError,
        exception::RiskLevel,
    };

    use crate::config::GovernanceConfig;

    // ── 1. full config parses ─────────────────────────────────────────────────

    #[test]
    fn test_full_config_parses() {
        let toml = r#"
            [risk]
            medium_threshold = 25
            high_threshold = 55

            [quorum]
            low = 1
            medium = 2
            high = 3

            [reviewers]
            low = ["security-lead"]
            medium = ["security-lead", "legal-team"]
            high = ["ethics-board"]

            [metrics]
            retention_hours = 48
        "#;

        let config = GovernanceConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.risk.medium_threshold, 25);
        assert_eq!(config.risk.high_threshold, 55);
        assert_eq!(config.quorum.for_risk(RiskLevel::Medium), 2);
        assert_eq!(config.reviewers.high, vec!["ethics-board".to_string()]);
        assert_eq!(config.metrics.retention_hours, 48);
    }

    // ── 2. empty config falls back to defaults ───────────────────────────────

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = GovernanceConfig::from_toml_str("").unwrap();
        assert_eq!(config.risk.medium_threshold, 30);
        assert_eq!(config.risk.high_threshold, 60);
        assert_eq!(config.quorum.for_risk(RiskLevel::Low), 1);
        assert_eq!(config.quorum.for_risk(RiskLevel::High), 3);
        assert_eq!(config.metrics.retention_hours, 168);
    }

    // ── 3. inverted thresholds are rejected ──────────────────────────────────

    #[test]
    fn test_inverted_thresholds_rejected() {
        let toml = r#"
            [risk]
            medium_threshold = 70
            high_threshold = 60
        "#;

        match GovernanceConfig::from_toml_str(toml) {
            Err(PraetorError::ConfigError { reason }) => {
                assert!(reason.contains("medium_threshold"), "unexpected reason: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    // ── 4. zero quorum is rejected ───────────────────────────────────────────

    #[test]
    fn test_zero_quorum_rejected() {
        let toml = r#"
            [quorum]
            medium = 0
        "#;

        match GovernanceConfig::from_toml_str(toml) {
            Err(PraetorError::ConfigError { reason }) => {
                assert!(reason.contains("quorum"), "unexpected reason: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    // ── 5. malformed TOML is a ConfigError ───────────────────────────────────

    #[test]
    fn test_malformed_toml_rejected() {
        let result = GovernanceConfig::from_toml_str("this is not valid toml ][[[");
        match result {
            Err(PraetorError::ConfigError { reason }) => {
                assert!(reason.contains("failed to parse"), "unexpected reason: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }
}
