//! In-memory implementation of `AuditSink`.
//!
//! `InMemoryAuditLog` is the reference implementation of the audit log.
//! It keeps all records in a `Vec` behind a single `Mutex`, which is also
//! the serialization point the concurrency model requires: evaluation is
//! fully parallel, but every decision flows through this one ordered
//! append, so sequence numbers are strictly increasing with no gaps.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::debug;

use praetor_contracts::{
    audit::{AuditRecord, DecisionPayload},
    error::{PraetorError, PraetorResult},
};
use praetor_core::traits::AuditSink;

// ── Internal mutable state ────────────────────────────────────────────────────

/// The mutable interior of an `InMemoryAuditLog`.
pub(crate) struct LogState {
    /// All records written so far, in append order.
    pub(crate) records: Vec<AuditRecord>,

    /// The next sequence number to assign (starts at 0).
    pub(crate) sequence: u64,

    /// The `this_hash` of the last written record, or `GENESIS_HASH`
    /// before any record has been written.
    pub(crate) last_hash: String,
}

// ── Public log ────────────────────────────────────────────────────────────────

/// An in-memory, append-only audit log backed by a SHA-256 hash chain.
///
/// # Thread safety
///
/// All trait methods acquire the internal `Mutex`.  Clone the surrounding
/// `Arc<InMemoryAuditLog>` freely across threads.
pub struct InMemoryAuditLog {
    pub(crate) state: Arc<Mutex<LogState>>,
}

impl InMemoryAuditLog {
    /// Create an empty log.  `last_hash` starts at the genesis sentinel so
    /// the first record's `prev_hash` is automatically correct.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LogState {
                records: Vec::new(),
                sequence: 0,
                last_hash: AuditRecord::GENESIS_HASH.to_string(),
            })),
        }
    }

    /// Verify that the in-memory chain has not been tampered with.
    pub fn verify_integrity(&self) -> bool {
        let state = self.state.lock().expect("audit log lock poisoned");
        crate::chain::verify_chain(&state.records)
    }

    /// Number of records written so far.
    pub fn len(&self) -> usize {
        self.state.lock().expect("audit log lock poisoned").records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

// ── AuditSink impl ────────────────────────────────────────────────────────────

impl AuditSink for InMemoryAuditLog {
    /// Append one record to the hash chain.
    ///
    /// Hashes the triggering input, computes `this_hash` from (sequence,
    /// actor, prev_hash, input_hash, payload), appends the record, then
    /// advances the sequence counter and `last_hash`.  There is no update
    /// or delete path.
    fn append(
        &self,
        actor: &str,
        payload: DecisionPayload,
        input: &serde_json::Value,
    ) -> PraetorResult<AuditRecord> {
        let mut state = self.state.lock().map_err(|e| PraetorError::AuditWriteFailed {
            reason: format!("audit log lock poisoned: {}", e),
        })?;

        let sequence = state.sequence;
        let prev_hash = state.last_hash.clone();
        let input_hash = crate::chain::hash_input(input);
        let this_hash =
            crate::chain::hash_record(sequence, actor, &payload, &input_hash, &prev_hash);

        let record = AuditRecord {
            sequence,
            timestamp: Utc::now(),
            actor: actor.to_string(),
            payload,
            input_hash,
            prev_hash,
            this_hash: this_hash.clone(),
        };

        debug!(sequence, actor = %record.actor, "audit record appended");

        state.records.push(record.clone());
        state.sequence += 1;
        state.last_hash = this_hash;

        Ok(record)
    }

    fn records_since(&self, since: u64) -> PraetorResult<Vec<AuditRecord>> {
        let state = self.state.lock().map_err(|e| PraetorError::AuditWriteFailed {
            reason: format!("audit log lock poisoned: {}", e),
        })?;
        Ok(state
            .records
            .iter()
            .filter(|r| r.sequence >= since)
            .cloned()
            .collect())
    }

    fn snapshot(&self) -> PraetorResult<Vec<AuditRecord>> {
        self.records_since(0)
    }
}
