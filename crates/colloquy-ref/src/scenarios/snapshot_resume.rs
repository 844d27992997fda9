//! Scenario 3: Snapshot and Resume
//!
//! Onboarding is interrupted halfway through the mood check. The
//! conversation is snapshotted into a hash-chained journal, exported as
//! JSON, and the coordinator is dropped. A new coordinator is hydrated from
//! the journal and finishes the mood check; its score still reaches
//! onboarding. A tampered copy of the journal is refused.

use serde_json::json;

use colloquy_contracts::{
    config::CoordinatorConfig,
    error::{ColloquyError, ColloquyResult},
    message::UserInput,
};
use colloquy_core::{Coordinator, SnapshotStore};
use colloquy_journal::{InMemoryJournal, Journal};

use crate::{dialogues::onboarding, registry::ReferenceDialogues};

use super::Transcript;

pub async fn run_scenario() -> ColloquyResult<()> {
    println!("=== Scenario 3: Snapshot and Resume ===");
    println!();

    // ── First session ─────────────────────────────────────────────────────────

    let mut coordinator = Coordinator::with_root(CoordinatorConfig::default(), Box::new(onboarding::dialogue()));
    let journal = InMemoryJournal::new(coordinator.id());
    let mut transcript = Transcript::new();

    coordinator.start().await?;
    for input in [
        UserInput::text("Alan"),
        UserInput::choice("41", json!(41)),
        UserInput::choice("Yes", json!(true)),
        UserInput::choice("Several days", json!(1)),
    ] {
        coordinator.send_user_message(input).await;
        journal.save(&coordinator.snapshot())?;
    }
    transcript.print_new(&coordinator);

    let exported = serde_json::to_string(&journal.export_journal()?).map_err(|e| ColloquyError::JournalError {
        reason: format!("failed to serialize journal: {e}"),
    })?;
    println!();
    println!("  Snapshots journaled:    {}", journal.len());
    println!("  Stack at snapshot:      {}", coordinator.stack().join(" > "));
    println!("  Exported journal:       {} bytes of JSON", exported.len());
    drop(coordinator);

    // ── Tampered copy ─────────────────────────────────────────────────────────

    let mut tampered: Journal = parse(&exported)?;
    if let Some(entry) = tampered.entries.first_mut() {
        entry.snapshot.did_start = !entry.snapshot.did_start;
    }
    match InMemoryJournal::from_journal(tampered) {
        Ok(_) => println!("  Tampered journal:       UNEXPECTEDLY ACCEPTED"),
        Err(e) => println!("  Tampered journal:       REFUSED ({e})"),
    }

    // ── Second session ────────────────────────────────────────────────────────

    let journal = InMemoryJournal::from_journal(parse(&exported)?)?;
    let snapshot = journal
        .load_latest(&journal.conversation_id())?
        .ok_or_else(|| ColloquyError::InvalidSnapshot {
            reason: "journal holds no snapshot".to_string(),
        })?;
    let mut coordinator = Coordinator::from_snapshot(CoordinatorConfig::default(), snapshot, &ReferenceDialogues)?;
    println!("  Hydrated stack:         {}", coordinator.stack().join(" > "));
    println!();

    for points in [2, 3] {
        coordinator.send_user_message(UserInput::choice(points.to_string(), json!(points))).await;
        journal.save(&coordinator.snapshot())?;
    }
    transcript.print_new(&coordinator);

    println!();
    println!(
        "  Journal integrity:      {} ({} snapshot(s))",
        if journal.verify_integrity() { "VERIFIED" } else { "FAILED" },
        journal.len()
    );
    println!("  Dialogues left:         {}", coordinator.stack().len());
    println!("  RESULT: SUCCESS");
    println!();
    Ok(())
}

fn parse(exported: &str) -> ColloquyResult<Journal> {
    serde_json::from_str(exported).map_err(|e| ColloquyError::JournalError {
        reason: format!("failed to parse journal: {e}"),
    })
}
