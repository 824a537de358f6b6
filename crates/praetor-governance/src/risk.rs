//! Deterministic risk scoring and tier routing.
//!
//! The classifier turns request metadata into an integer score, maps the
//! score to a risk level via two configured thresholds, and maps the level
//! to a governance tier.  No randomness, no history lookups: identical
//! metadata always produces the identical level.

use tracing::debug;

use praetor_contracts::{
    exception::{RiskLevel, Tier},
    request::{RequestMetadata, SensitivityClass},
};
use praetor_core::config::RiskThresholds;

const HOUR: i64 = 3600;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

/// Scores request metadata and routes it to a risk level.
#[derive(Debug, Clone)]
pub struct RiskClassifier {
    thresholds: RiskThresholds,
}

impl RiskClassifier {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    /// The weighted integer score for the given metadata.
    ///
    /// Components: sensitivity class weight, blast radius (capped at 50
    /// resources), requested duration band, and the actor's prior-violation
    /// count (capped at 4).
    pub fn score(&self, metadata: &RequestMetadata) -> u32 {
        let sensitivity = match metadata.sensitivity {
            SensitivityClass::Public => 0,
            SensitivityClass::Internal => 10,
            SensitivityClass::Confidential => 25,
            SensitivityClass::Restricted => 40,
        };

        let blast = 2 * metadata.blast_radius.min(50);

        let duration = match metadata.requested_duration_secs {
            None => 0,
            Some(secs) if secs <= 4 * HOUR => 0,
            Some(secs) if secs <= DAY => 10,
            Some(secs) if secs <= WEEK => 20,
            Some(_) => 35,
        };

        let violations = 15 * metadata.prior_violations.min(4);

        sensitivity + blast + duration + violations
    }

    /// Map metadata to a risk level using the configured thresholds.
    pub fn classify(&self, metadata: &RequestMetadata) -> RiskLevel {
        let score = self.score(metadata);
        let level = if score < self.thresholds.medium_threshold {
            RiskLevel::Low
        } else if score < self.thresholds.high_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        };
        debug!(score, level = ?level, "classified request risk");
        level
    }

    /// Map a risk level to its governance tier.
    ///
    /// Low risk routes to tier-1 automated approval only when the matched
    /// policy explicitly whitelists it; otherwise low risk is handled as a
    /// tier-2 managed exception like medium.
    pub fn tier_for(&self, level: RiskLevel, auto_approval_whitelisted: bool) -> Tier {
        match level {
            RiskLevel::Low if auto_approval_whitelisted => Tier::Automated,
            RiskLevel::Low | RiskLevel::Medium => Tier::ManagedException,
            RiskLevel::High => Tier::EthicsEscalation,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use praetor_contracts::request::RequestMetadata;

    use super::*;

    fn classifier() -> RiskClassifier {
        RiskClassifier::new(RiskThresholds::default())
    }

    #[test]
    fn test_score_components() {
        let c = classifier();

        // Baseline internal change: sensitivity 10 + blast 2.
        let metadata = RequestMetadata::default();
        assert_eq!(c.score(&metadata), 12);

        // Restricted, wide blast, week-long, repeat offender.
        let metadata = RequestMetadata {
            sensitivity: SensitivityClass::Restricted,
            blast_radius: 80,
            requested_duration_secs: Some(30 * DAY),
            prior_violations: 9,
        };
        // 40 + 2*50 + 35 + 15*4
        assert_eq!(c.score(&metadata), 235);
    }

    #[test]
    fn test_duration_bands() {
        let c = classifier();
        let with_duration = |secs| RequestMetadata {
            requested_duration_secs: Some(secs),
            ..RequestMetadata::default()
        };

        let base = c.score(&RequestMetadata::default());
        assert_eq!(c.score(&with_duration(4 * HOUR)), base);
        assert_eq!(c.score(&with_duration(4 * HOUR + 1)), base + 10);
        assert_eq!(c.score(&with_duration(DAY + 1)), base + 20);
        assert_eq!(c.score(&with_duration(WEEK + 1)), base + 35);
    }

    #[test]
    fn test_threshold_boundaries() {
        let c = RiskClassifier::new(RiskThresholds {
            medium_threshold: 30,
            high_threshold: 60,
        });

        // Score 12: below medium threshold.
        assert_eq!(c.classify(&RequestMetadata::default()), RiskLevel::Low);

        // Score 10 + 2*10 + 10 = 40: medium.
        let medium = RequestMetadata {
            blast_radius: 10,
            requested_duration_secs: Some(DAY),
            ..RequestMetadata::default()
        };
        assert_eq!(c.classify(&medium), RiskLevel::Medium);

        // Score 40 + 2*20 = 80: high.
        let high = RequestMetadata {
            sensitivity: SensitivityClass::Restricted,
            blast_radius: 20,
            ..RequestMetadata::default()
        };
        assert_eq!(c.classify(&high), RiskLevel::High);
    }

    #[test]
    fn test_determinism() {
        let c = classifier();
        let metadata = RequestMetadata {
            sensitivity: SensitivityClass::Confidential,
            blast_radius: 7,
            requested_duration_secs: Some(6 * HOUR),
            prior_violations: 1,
        };
        let first = c.classify(&metadata);
        for _ in 0..10 {
            assert_eq!(c.classify(&metadata), first);
        }
    }

    #[test]
    fn test_tier_routing() {
        let c = classifier();
        assert_eq!(c.tier_for(RiskLevel::Low, true), Tier::Automated);
        // Without the whitelist, low risk still gets a human reviewer.
        assert_eq!(c.tier_for(RiskLevel::Low, false), Tier::ManagedException);
        assert_eq!(c.tier_for(RiskLevel::Medium, true), Tier::ManagedException);
        assert_eq!(c.tier_for(RiskLevel::High, true), Tier::EthicsEscalation);
    }
}
