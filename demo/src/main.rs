//! colloquy demo CLI
//!
//! Chat with any reference dialogue in the terminal, or run the scripted
//! scenarios.
//!
//! Usage:
//!   cargo run -p demo -- chat
//!   cargo run -p demo -- chat --dialogue onboarding --journal conversation.json
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- undo
//!   cargo run -p demo -- help-interrupt
//!   cargo run -p demo -- snapshot-resume

mod chat;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use colloquy_contracts::error::ColloquyResult;
use colloquy_ref::scenarios::{help_interrupt, snapshot_resume, undo};

// ── CLI definition ────────────────────────────────────────────────────────────

/// colloquy: stack-based conversational dialogue engine demo.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "colloquy dialogue engine demo",
    long_about = "Chat with the reference dialogues or run scripted scenarios showing\n\
                  undo, keyword interruptions, and journaled snapshot/resume."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chat with a reference dialogue in the terminal.
    Chat {
        /// Dialogue to start with.
        #[arg(long, default_value = "menu")]
        dialogue: String,
        /// Journal file. Resumed when it exists, written after every message.
        #[arg(long)]
        journal: Option<PathBuf>,
        /// Coordinator configuration (TOML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Keyword rules (TOML). Defaults to the reference rules.
        #[arg(long)]
        keywords: Option<PathBuf>,
    },
    /// Run all scenarios in sequence.
    RunAll,
    /// Scenario 1: take back an answer.
    Undo,
    /// Scenario 2: keyword-triggered help over onboarding.
    HelpInterrupt,
    /// Scenario 3: journal a conversation and resume it.
    SnapshotResume,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::Chat {
            dialogue,
            journal,
            config,
            keywords,
        } => {
            chat::run(chat::ChatOptions {
                dialogue,
                journal,
                config,
                keywords,
            })
            .await
        }
        Command::RunAll => run_all().await,
        Command::Undo => undo::run_scenario().await,
        Command::HelpInterrupt => help_interrupt::run_scenario().await,
        Command::SnapshotResume => snapshot_resume::run_scenario().await,
    };

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

async fn run_all() -> ColloquyResult<()> {
    undo::run_scenario().await?;
    help_interrupt::run_scenario().await?;
    snapshot_resume::run_scenario().await?;
    println!("All scenarios completed successfully.");
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("colloquy: Stack-based Dialogue Engine");
    println!("=====================================");
    println!();
    println!("Per user message:");
    println!("  [1] Middleware runs in registration order and may halt the message");
    println!("  [2] The message is logged and dispatched to the active dialogue");
    println!("  [3] Dialogue outputs are checked against the stack and logged");
    println!("  [4] Finishing, transitioning and waiting dialogues reshape the stack");
    println!();
}
