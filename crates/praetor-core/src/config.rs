//! Governance configuration.
//!
//! The three-tier governance model is an explicit configuration object —
//! risk thresholds, approval quorums, reviewer pools, metrics retention —
//! injected into the engine at construction.  Deserialized from TOML, the
//! same way policy documents are.
//!
//! Example:
//! ```toml
//! [risk]
//! medium_threshold = 30
//! high_threshold = 60
//!
//! [quorum]
//! low = 1
//! medium = 2
//! high = 3
//!
//! [reviewers]
//! low = ["security-lead"]
//! medium = ["security-lead", "legal-team"]
//! high = ["ethics-board"]
//!
//! [metrics]
//! retention_hours = 168
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use praetor_contracts::{
    error::{PraetorError, PraetorResult},
    exception::RiskLevel,
};

/// Score boundaries between risk levels.
///
/// A weighted score below `medium_threshold` is Low, below
/// `high_threshold` is Medium, and High otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskThresholds {
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: u32,
    #[serde(default = "default_high_threshold")]
    pub high_threshold: u32,
}

fn default_medium_threshold() -> u32 {
    30
}

fn default_high_threshold() -> u32 {
    60
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium_threshold: default_medium_threshold(),
            high_threshold: default_high_threshold(),
        }
    }
}

/// How many distinct reviewer approvals each risk level requires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuorumConfig {
    #[serde(default = "default_quorum_low")]
    pub low: usize,
    #[serde(default = "default_quorum_medium")]
    pub medium: usize,
    #[serde(default = "default_quorum_high")]
    pub high: usize,
}

fn default_quorum_low() -> usize {
    1
}

fn default_quorum_medium() -> usize {
    2
}

fn default_quorum_high() -> usize {
    3
}

impl Default for QuorumConfig {
    fn default() -> Self {
        Self {
            low: default_quorum_low(),
            medium: default_quorum_medium(),
            high: default_quorum_high(),
        }
    }
}

impl QuorumConfig {
    /// The quorum for a given risk level.
    pub fn for_risk(&self, risk: RiskLevel) -> usize {
        match risk {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
        }
    }
}

/// Static reviewer pools per risk level.
///
/// Feeds `StaticReviewerDirectory`; deployments with a real identity
/// provider can ignore this section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewerPools {
    #[serde(default)]
    pub low: Vec<String>,
    #[serde(default)]
    pub medium: Vec<String>,
    #[serde(default)]
    pub high: Vec<String>,
}

/// Metrics aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Buckets older than this are evicted.
    #[serde(default = "default_retention_hours")]
    pub retention_hours: i64,
}

fn default_retention_hours() -> i64 {
    7 * 24
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            retention_hours: default_retention_hours(),
        }
    }
}

/// The complete governance configuration injected into the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GovernanceConfig {
    #[serde(default)]
    pub risk: RiskThresholds,
    #[serde(default)]
    pub quorum: QuorumConfig,
    #[serde(default)]
    pub reviewers: ReviewerPools,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl GovernanceConfig {
    /// Parse `s` as TOML and build a `GovernanceConfig`.
    ///
    /// Returns `PraetorError::ConfigError` if the TOML is malformed or does
    /// not match the expected schema.
    pub fn from_toml_str(s: &str) -> PraetorResult<Self> {
        let config: GovernanceConfig =
            toml::from_str(s).map_err(|e| PraetorError::ConfigError {
                reason: format!("failed to parse governance config TOML: {}", e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it as governance configuration.
    pub fn from_file(path: &Path) -> PraetorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| PraetorError::ConfigError {
            reason: format!(
                "failed to read governance config '{}': {}",
                path.display(),
                e
            ),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Reject configurations that cannot route requests sensibly.
    fn validate(&self) -> PraetorResult<()> {
        if self.risk.medium_threshold >= self.risk.high_threshold {
            return Err(PraetorError::ConfigError {
                reason: format!(
                    "medium_threshold ({}) must be below high_threshold ({})",
                    self.risk.medium_threshold, self.risk.high_threshold
                ),
            });
        }
        if self.quorum.low == 0 || self.quorum.medium == 0 || self.quorum.high == 0 {
            return Err(PraetorError::ConfigError {
                reason: "approval quorum must be at least 1 for every risk level".to_string(),
            });
        }
        Ok(())
    }
}
