//! PRAETOR — Governance Engine Demo CLI
//!
//! Runs one or all of the four governance scenarios.  Each scenario wires
//! real PRAETOR components (policy store, evaluator, audit log, engine)
//! around a steppable clock.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- evaluation
//!   cargo run -p demo -- exception-lifecycle
//!   cargo run -p demo -- escalation
//!   cargo run -p demo -- metrics

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod scenarios;

// ── CLI definition ────────────────────────────────────────────────────────────

/// PRAETOR — policy evaluation and tiered-governance demo.
///
/// Each subcommand runs one or all of the governance scenarios,
/// demonstrating fail-closed evaluation, tier routing, time-bound
/// exceptions, and the tamper-evident audit chain.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "PRAETOR governance engine demo",
    long_about = "Runs PRAETOR governance scenarios showing fail-closed policy\n\
                  evaluation, risk-based tier routing, time-bound exception\n\
                  grants, ethics escalation, and audit chain integrity."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all four governance scenarios in sequence.
    RunAll,
    /// Scenario 1: fail-closed evaluation and load-time policy rejection.
    Evaluation,
    /// Scenario 2: deny → quorum-approved exception → expiry → deny again.
    ExceptionLifecycle,
    /// Scenario 3: high-risk submission, linked case, board resolution.
    Escalation,
    /// Scenario 4: windowed metrics over the audit log.
    Metrics,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::Evaluation => scenarios::evaluation(),
        Command::ExceptionLifecycle => scenarios::exception_lifecycle(),
        Command::Escalation => scenarios::escalation(),
        Command::Metrics => scenarios::metrics(),
    };

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_all() -> praetor_contracts::error::PraetorResult<()> {
    scenarios::evaluation()?;
    scenarios::exception_lifecycle()?;
    scenarios::escalation()?;
    scenarios::metrics()?;
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("PRAETOR — Policy Evaluation & Tiered Governance");
    println!("===============================================");
    println!();
    println!("Decision pipeline per request:");
    println!("  [1] Structural validation against the request schema");
    println!("  [2] Rule evaluation → Allow / Deny / RequireApproval (fail-closed)");
    println!("  [3] Risk classification routes approvals to tier 1 / 2 / 3");
    println!("  [4] Active exception grants override a deny, time-bound");
    println!("  [5] Every decision appended to the SHA-256 audit chain");
    println!();
}
