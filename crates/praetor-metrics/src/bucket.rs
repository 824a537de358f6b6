//! Per-hour counter buckets.
//!
//! The aggregator keys buckets by unix hour and adds counters
//! incrementally as audit records are ingested — there is no full rescan
//! path.  Buckets older than the retention window are evicted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bucket key: hours since the unix epoch.
pub type HourKey = i64;

/// The unix hour containing `at`.
pub fn hour_key(at: DateTime<Utc>) -> HourKey {
    at.timestamp().div_euclid(3600)
}

/// Counters accumulated for one hour of audit records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Completed evaluations.
    pub evaluations: u64,

    /// Evaluations whose final verdict was deny.
    pub denials: u64,

    /// Tier-2 exceptions approved this hour.
    pub tier2_approved: u64,

    /// Tier-2 exceptions denied this hour.
    pub tier2_denied: u64,

    /// Sum of deny-to-covering-approval intervals credited this hour.
    pub remediation_secs_sum: i64,
    pub remediation_count: u64,

    /// Sum of escalation open-to-resolution intervals credited this hour.
    pub tier3_cycle_secs_sum: i64,
    pub tier3_resolved: u64,
}
