//! # praetor-governance
//!
//! The tiered-governance layer of PRAETOR: risk classification, the
//! exception request lifecycle, escalation case tracking, structural
//! request validation, and the `Engine` facade that wires them to the
//! policy evaluator, audit sink, reviewer directory, and notifier seams.
//!
//! ## The tier protocol
//!
//! A `require_approval` verdict (or a deny the requester wants overridden)
//! becomes an exception request.  The risk classifier scores the request
//! and routes it:
//!
//! - **Tier 1** — low risk on a policy that whitelists auto-approval:
//!   approved immediately under the `system` actor.
//! - **Tier 2** — managed exception: routed to the reviewer pool for its
//!   risk level; approval requires the configured quorum.
//! - **Tier 3** — ethics escalation: a linked `EscalationCase` is opened
//!   for out-of-band deliberation.
//!
//! Approved exceptions are time-bound; expiry is re-derived at every read
//! and enforced by an idempotent sweep.

pub mod engine;
pub mod escalation;
pub mod exception;
pub mod risk;
pub mod validate;

pub use engine::{Engine, ExceptionSubmission, SubmissionOutcome};
pub use escalation::EscalationTracker;
pub use exception::{AppliedTransition, ExceptionManager, ReviewOutcome};
pub use risk::RiskClassifier;
pub use validate::validate_request;

// ── Tests ─────────────────────────────────────────────────────────────────────
