//! Hash-chain primitives: content hashing and chain integrity verification.
//!
//! Every field that contributes to a record's hash is listed explicitly so
//! nothing is accidentally omitted.
//!
//! Hash input layout (bytes, in order):
//!   1. sequence as 8-byte little-endian
//!   2. actor as UTF-8 bytes
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. input_hash as UTF-8 bytes (64 ASCII hex chars)
//!   5. canonical JSON of the decision payload (serde_json, no pretty-printing)

use sha2::{Digest, Sha256};

use praetor_contracts::audit::{AuditRecord, DecisionPayload};

/// Compute the SHA-256 content hash of a triggering input.
///
/// This is the `input_hash` stored on every record: a compact commitment
/// to the exact request, review action, or sweep trigger that produced the
/// decision.  Returns a lowercase 64-character hex string.
pub fn hash_input(input: &serde_json::Value) -> String {
    // serde_json::to_vec is deterministic for a given Value: no whitespace,
    // stable key order within the same value.
    let bytes = serde_json::to_vec(input).expect("JSON value must always serialize");
    hex::encode(Sha256::digest(&bytes))
}

/// Compute the SHA-256 hash for a single audit record.
///
/// The hash commits to the record's position (`sequence`), its author
/// (`actor`), its link to the previous record (`prev_hash`), the input it
/// was triggered by (`input_hash`), and the full decision payload.
pub fn hash_record(
    sequence: u64,
    actor: &str,
    payload: &DecisionPayload,
    input_hash: &str,
    prev_hash: &str,
) -> String {
    let payload_json =
        serde_json::to_vec(payload).expect("DecisionPayload must always be serializable to JSON");

    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(actor.as_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(input_hash.as_bytes());
    hasher.update(&payload_json);

    hex::encode(hasher.finalize())
}

/// Verify the integrity of a record chain.
///
/// Returns `true` when the chain is valid according to all three rules:
///
/// 1. **Sequence** — records are numbered 0, 1, 2, … with no gaps.
/// 2. **Prev-hash linkage** — each record's `prev_hash` equals the
///    `this_hash` of the preceding record (or `GENESIS_HASH` for record 0).
/// 3. **Hash correctness** — each record's `this_hash` matches the value
///    recomputed from its own fields.
///
/// Returns `false` the moment any mismatch is detected.  An empty chain
/// is defined as valid.
pub fn verify_chain(records: &[AuditRecord]) -> bool {
    let mut expected_prev = AuditRecord::GENESIS_HASH.to_string();

    for (idx, record) in records.iter().enumerate() {
        if record.sequence != idx as u64 {
            return false;
        }

        if record.prev_hash != expected_prev {
            return false;
        }

        let recomputed = hash_record(
            record.sequence,
            &record.actor,
            &record.payload,
            &record.input_hash,
            &record.prev_hash,
        );
        if record.this_hash != recomputed {
            return false;
        }

        expected_prev = record.this_hash.clone();
    }

    true
}
