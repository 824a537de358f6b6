//! # praetor-metrics
//!
//! Windowed governance metrics derived from the PRAETOR audit log.
//!
//! The `MetricsAggregator` tails the audit log through a sequence cursor
//! and maintains per-hour counter buckets.  Queries sum the buckets that
//! fall inside a timeframe and report:
//!
//! - evaluation and denial counts, and the violation rate
//! - tier-2 exception approval rate
//! - mean time from a deny verdict to a covering exception approval
//! - mean escalation open-to-resolution cycle time
//!
//! All figures are exact aggregates of audit records.  Buckets past the
//! configured retention window are evicted on ingest.

pub mod aggregator;
pub mod bucket;

pub use aggregator::{MetricsAggregator, MetricsReport, Timeframe};
pub use bucket::{hour_key, Bucket, HourKey};

// ── Tests ─────────────────────────────────────────────────────────────────────
