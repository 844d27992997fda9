//! Scenario 2: Help Interruption
//!
//! Keyword middleware is loaded from the reference keyword rules. Typing
//! "I'm stuck" in the middle of onboarding pushes the help dialogue on top;
//! once help finishes, onboarding picks up again and repeats its question.
//! A "thanks" is answered by the middleware itself and never reaches the
//! dialogue.

use std::sync::Arc;

use serde_json::json;

use colloquy_contracts::{config::CoordinatorConfig, error::ColloquyResult, message::UserInput};
use colloquy_core::{Coordinator, CoordinatorEvent};
use colloquy_middleware::TracingMiddleware;

use crate::{dialogues::onboarding, keyword_middleware};

use super::Transcript;

pub async fn run_scenario() -> ColloquyResult<()> {
    println!("=== Scenario 2: Help Interruption ===");
    println!();

    let mut coordinator = Coordinator::with_root(CoordinatorConfig::default(), Box::new(onboarding::dialogue()));
    coordinator.add_middleware(Arc::new(keyword_middleware()?));
    coordinator.add_middleware(Arc::new(TracingMiddleware));
    let mut events = coordinator.subscribe();
    let mut transcript = Transcript::new();

    coordinator.start().await?;
    for input in [
        UserInput::text("Grace"),
        UserInput::text("I'm stuck"),
        UserInput::choice("Yes", json!(true)),
        UserInput::text("The slider does not move"),
        UserInput::text("thanks"),
        UserInput::choice("45", json!(45)),
        UserInput::choice("No", json!(false)),
    ] {
        coordinator.send_user_message(input).await;
        transcript.print_new(&coordinator);
    }

    println!();
    while let Ok(event) = events.try_recv() {
        match event {
            CoordinatorEvent::DialoguePushed { identifier } => println!("  Stack: pushed  {identifier}"),
            CoordinatorEvent::DialogueRemoved { identifier } => println!("  Stack: removed {identifier}"),
            CoordinatorEvent::DialogueError(error) => println!("  Dialogue error: {error}"),
            _ => {}
        }
    }
    println!("  RESULT: SUCCESS");
    println!();
    Ok(())
}
