//! Incremental metrics aggregation over the audit log.
//!
//! The aggregator consumes audit records through a sequence cursor
//! (`ingest` is fed `records_since(cursor)`), updates per-hour buckets,
//! and answers windowed queries.  Every figure is derived strictly from
//! audit records — nothing is sampled, estimated, or perturbed.
//!
//! Cross-record joins kept between ingests:
//! - the earliest unremediated denial per resource, for
//!   mean-time-to-remediate
//! - each exception's tier and resource (from its submission record)
//! - each open escalation case's opening time

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use praetor_contracts::{
    audit::{AuditRecord, DecisionPayload},
    escalation::{CaseId, EscalationStatus},
    exception::{ExceptionId, ExceptionStatus, Tier},
    request::ResourceDescriptor,
    verdict::Verdict,
};

use crate::bucket::{hour_key, Bucket, HourKey};

/// A query window over the bucketed history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    LastDay,
    LastWeek,
    LastHours(i64),
}

impl Timeframe {
    fn hours(&self) -> i64 {
        match self {
            Timeframe::LastDay => 24,
            Timeframe::LastWeek => 7 * 24,
            Timeframe::LastHours(h) => *h,
        }
    }
}

/// Aggregated counters for one query window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub window_hours: i64,
    pub evaluations: u64,
    pub denials: u64,
    /// denials / evaluations, 0.0 when no evaluations fell in the window.
    pub violation_rate: f64,
    pub tier2_approved: u64,
    pub tier2_denied: u64,
    /// approved / (approved + denied) among tier-2 reviews in the window.
    pub tier2_approval_rate: Option<f64>,
    /// Mean seconds from a deny verdict to a covering exception approval.
    pub mean_time_to_remediate_secs: Option<f64>,
    /// Mean seconds from escalation open to resolution.
    pub tier3_cycle_time_secs: Option<f64>,
}

fn resource_key(resource: &ResourceDescriptor) -> String {
    format!("{}/{}", resource.kind, resource.name)
}

/// The incremental aggregator.  Single-consumer: wrap in a `Mutex` when
/// shared.
pub struct MetricsAggregator {
    /// Next audit sequence to consume.
    cursor: u64,

    buckets: BTreeMap<HourKey, Bucket>,

    /// Buckets older than this many hours are evicted at ingest time.
    retention_hours: i64,

    /// Earliest unremediated denial per resource key.
    open_denials: HashMap<String, DateTime<Utc>>,

    /// Tier and resource of every submitted exception, for joining its
    /// later transitions.
    exception_meta: HashMap<ExceptionId, (Tier, String)>,

    /// Opening time of every not-yet-resolved escalation case.
    open_cases: HashMap<CaseId, DateTime<Utc>>,
}

impl MetricsAggregator {
    pub fn new(retention_hours: i64) -> Self {
        Self {
            cursor: 0,
            buckets: BTreeMap::new(),
            retention_hours,
            open_denials: HashMap::new(),
            exception_meta: HashMap::new(),
            open_cases: HashMap::new(),
        }
    }

    /// The next audit sequence this aggregator expects.
    ///
    /// Feed `ingest` with `audit.records_since(aggregator.cursor())` so no
    /// record is counted twice.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Consume a batch of audit records in sequence order.
    ///
    /// Records below the cursor are skipped, so re-delivering an overlapping
    /// batch is harmless.
    pub fn ingest(&mut self, records: &[AuditRecord], now: DateTime<Utc>) {
        for record in records {
            if record.sequence < self.cursor {
                continue;
            }
            self.cursor = record.sequence + 1;
            self.apply(record);
        }
        self.evict(now);
    }

    fn bucket_at(&mut self, at: DateTime<Utc>) -> &mut Bucket {
        self.buckets.entry(hour_key(at)).or_default()
    }

    fn apply(&mut self, record: &AuditRecord) {
        let at = record.timestamp;
        match &record.payload {
            DecisionPayload::Evaluation {
                verdict, resource, ..
            } => {
                let key = resource_key(resource);
                let bucket = self.bucket_at(at);
                bucket.evaluations += 1;
                if *verdict == Verdict::Deny {
                    bucket.denials += 1;
                    // Keep only the earliest open denial per resource.
                    self.open_denials.entry(key).or_insert(at);
                }
            }

            DecisionPayload::ExceptionSubmitted {
                exception_id,
                resource,
                tier,
                ..
            } => {
                self.exception_meta
                    .insert(*exception_id, (*tier, resource_key(resource)));
            }

            DecisionPayload::ExceptionTransition {
                exception_id, to, ..
            } => {
                let meta = self.exception_meta.get(exception_id).cloned();
                match to {
                    ExceptionStatus::Approved => {
                        if let Some((tier, key)) = meta {
                            if tier == Tier::ManagedException {
                                self.bucket_at(at).tier2_approved += 1;
                            }
                            // A covering approval remediates the earliest
                            // open denial for the same resource.
                            if let Some(denied_at) = self.open_denials.remove(&key) {
                                let secs = (at - denied_at).num_seconds();
                                let bucket = self.bucket_at(at);
                                bucket.remediation_secs_sum += secs;
                                bucket.remediation_count += 1;
                            }
                        }
                    }
                    ExceptionStatus::Denied => {
                        if let Some((Tier::ManagedException, _)) = meta {
                            self.bucket_at(at).tier2_denied += 1;
                        }
                    }
                    _ => {}
                }
            }

            DecisionPayload::EscalationOpened { case_id, .. } => {
                self.open_cases.insert(*case_id, at);
            }

            DecisionPayload::EscalationTransition { case_id, to, .. } => {
                if *to == EscalationStatus::Resolved {
                    if let Some(opened_at) = self.open_cases.remove(case_id) {
                        let secs = (at - opened_at).num_seconds();
                        let bucket = self.bucket_at(at);
                        bucket.tier3_cycle_secs_sum += secs;
                        bucket.tier3_resolved += 1;
                    }
                }
            }

            // Failures, rejections, and policy lifecycle records are part
            // of the audit trail but carry no windowed counter.
            _ => {}
        }
    }

    /// Drop buckets older than the retention window.
    fn evict(&mut self, now: DateTime<Utc>) {
        let oldest = hour_key(now) - self.retention_hours;
        let evicted: Vec<HourKey> = self
            .buckets
            .range(..oldest)
            .map(|(k, _)| *k)
            .collect();
        for key in &evicted {
            self.buckets.remove(key);
        }
        if !evicted.is_empty() {
            debug!(count = evicted.len(), "evicted metrics buckets past retention");
        }
    }

    /// Aggregate every bucket inside the window ending at `now`.
    pub fn query(&self, timeframe: Timeframe, now: DateTime<Utc>) -> MetricsReport {
        let hours = timeframe.hours();
        let from = hour_key(now) - hours + 1;

        let mut total = Bucket::default();
        for (_, bucket) in self.buckets.range(from..) {
            total.evaluations += bucket.evaluations;
            total.denials += bucket.denials;
            total.tier2_approved += bucket.tier2_approved;
            total.tier2_denied += bucket.tier2_denied;
            total.remediation_secs_sum += bucket.remediation_secs_sum;
            total.remediation_count += bucket.remediation_count;
            total.tier3_cycle_secs_sum += bucket.tier3_cycle_secs_sum;
            total.tier3_resolved += bucket.tier3_resolved;
        }

        let reviewed = total.tier2_approved + total.tier2_denied;
        MetricsReport {
            window_hours: hours,
            evaluations: total.evaluations,
            denials: total.denials,
            violation_rate: if total.evaluations > 0 {
                total.denials as f64 / total.evaluations as f64
            } else {
                0.0
            },
            tier2_approved: total.tier2_approved,
            tier2_denied: total.tier2_denied,
            tier2_approval_rate: (reviewed > 0)
                .then(|| total.tier2_approved as f64 / reviewed as f64),
            mean_time_to_remediate_secs: (total.remediation_count > 0)
                .then(|| total.remediation_secs_sum as f64 / total.remediation_count as f64),
            tier3_cycle_time_secs: (total.tier3_resolved > 0)
                .then(|| total.tier3_cycle_secs_sum as f64 / total.tier3_resolved as f64),
        }
    }
}
