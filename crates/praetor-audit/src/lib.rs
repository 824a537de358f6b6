//! # praetor-audit
//!
//! Immutable, append-only, SHA-256 hash-chained audit log for PRAETOR
//! decisions.
//!
//! ## Overview
//!
//! Every evaluation verdict and every exception/escalation transition —
//! success or failure — appends exactly one `AuditRecord`.  Each record
//! carries a content hash of its triggering input and links to the
//! previous record via its SHA-256 hash.  Tampering with any record —
//! even a single byte — breaks the chain and is detected by
//! `verify_chain`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use praetor_audit::InMemoryAuditLog;
//! use praetor_core::traits::AuditSink;
//!
//! let log = InMemoryAuditLog::new();
//! log.append("alice", payload, &input)?;
//! assert!(log.verify_integrity());
//! ```

pub mod chain;
pub mod log;

pub use chain::{hash_input, hash_record, verify_chain};
pub use log::InMemoryAuditLog;

// ── Tests ─────────────────────────────────────────────────────────────────────
