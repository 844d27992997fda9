//! Scenario 1: Undo
//!
//! Walks through onboarding and takes back the age answer. The dialogue
//! rewinds to the age question and the log is cut back to it. Undoing the
//! name answer once the mood check is on top is refused, because the
//! prompt belongs to a dialogue that is no longer active.

use serde_json::json;

use colloquy_contracts::{config::CoordinatorConfig, error::ColloquyResult, message::UserInput};
use colloquy_core::Coordinator;

use crate::dialogues::onboarding;

use super::{last_user_message_id, Transcript};

pub async fn run_scenario() -> ColloquyResult<()> {
    println!("=== Scenario 1: Undo ===");
    println!();

    let mut coordinator = Coordinator::with_root(CoordinatorConfig::default(), Box::new(onboarding::dialogue()));
    let mut transcript = Transcript::new();

    coordinator.start().await?;
    coordinator.send_user_message(UserInput::text("Ada")).await;
    let name_answer = last_user_message_id(&coordinator)?;
    coordinator.send_user_message(UserInput::choice("63", json!(63))).await;
    transcript.print_new(&coordinator);

    // ── Take back the age ─────────────────────────────────────────────────────

    let age_answer = last_user_message_id(&coordinator)?;
    let before = coordinator.message_log().len();
    coordinator.undo_user_message(age_answer)?;
    println!();
    println!(
        "  Undo age answer:        OK ({} message(s) removed)",
        before - coordinator.message_log().len()
    );
    println!(
        "  Waiting on:             {}",
        coordinator.active_input_mode().map(|m| m.kind_name()).unwrap_or("-")
    );
    println!();

    coordinator.send_user_message(UserInput::choice("36", json!(36))).await;
    coordinator.send_user_message(UserInput::choice("Yes", json!(true))).await;
    transcript.print_new(&coordinator);

    // ── Cross-dialogue undo is refused ────────────────────────────────────────

    println!();
    match coordinator.undo_user_message(name_answer) {
        Ok(()) => println!("  Undo name answer:       UNEXPECTEDLY ACCEPTED"),
        Err(e) => println!("  Undo name answer:       REFUSED ({e})"),
    }
    println!("  Active dialogue:        {}", coordinator.active_dialogue().unwrap_or("-"));
    println!();

    for points in [1, 0, 2] {
        coordinator.send_user_message(UserInput::choice(points.to_string(), json!(points))).await;
    }
    transcript.print_new(&coordinator);

    println!();
    println!("  Dialogues left:         {}", coordinator.stack().len());
    println!("  RESULT: SUCCESS");
    println!();
    Ok(())
}
