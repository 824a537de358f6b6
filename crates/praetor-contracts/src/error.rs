//! Error taxonomy for the PRAETOR governance engine.
//!
//! All fallible operations return `PraetorResult<T>`.  Variants carry enough
//! context to produce actionable audit entries: every failure path in the
//! engine still writes exactly one audit record before surfacing its error.

use thiserror::Error;

/// The unified error type for the PRAETOR engine.
#[derive(Debug, Error)]
pub enum PraetorError {
    /// The incoming request is malformed or missing required fields.
    ///
    /// Rejected before any rule is consulted — missing fields are never
    /// silently defaulted.
    #[error("request validation failed: {reason}")]
    Validation { reason: String },

    /// An evaluation referenced a policy set or version that is not loaded.
    ///
    /// This fails the whole evaluation; no partial result is produced.
    #[error("policy '{policy_id}' (version {version:?}) not found")]
    PolicyNotFound {
        policy_id: String,
        version: Option<String>,
    },

    /// A concurrent state transition lost its optimistic-concurrency race.
    ///
    /// The caller should re-fetch the current state and decide whether to
    /// retry.
    #[error("conflicting state transition: {reason}")]
    Conflict { reason: String },

    /// A policy document was rejected at load time.
    ///
    /// Cyclic or over-deep predicate graphs are caught here, never during
    /// evaluation, so evaluation latency stays bounded.
    #[error("policy load rejected: {reason}")]
    LoadRejected { reason: String },

    /// A reviewer attempted an action they are not authorized for.
    #[error("reviewer '{reviewer}' is not authorized: {reason}")]
    Unauthorized { reviewer: String, reason: String },

    /// A referenced exception request or escalation case does not exist.
    #[error("{what} '{id}' not found")]
    NotFound { what: String, id: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The audit sink could not persist a record.
    ///
    /// Treated as fatal — a decision that cannot be audited cannot stand.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },
}

/// Convenience alias used throughout the PRAETOR crates.
pub type PraetorResult<T> = Result<T, PraetorError>;
