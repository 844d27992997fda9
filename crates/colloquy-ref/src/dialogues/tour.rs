//! A three-step button tour built on `LinearDialogue`.

use std::sync::Arc;

use serde_json::Value;

use colloquy_contracts::{error::ColloquyResult, snapshot::DialogueSnapshot};
use colloquy_script::{LinearDialogue, LinearPrompt, LinearStep};

pub const IDENTIFIER: &str = "tour";

fn steps() -> Vec<LinearStep> {
    let welcome: LinearStep = Arc::new(|_: &Value| {
        LinearPrompt::new(["Hi!", "Welcome to this simple waterfall dialogue."])
            .button("Hello")
            .button("Hey")
    });
    let colour: LinearStep =
        Arc::new(|_: &Value| LinearPrompt::new(["Do you prefer blue or yellow?"]).button("Blue").button("Yellow"));
    let goodbye: LinearStep = Arc::new(|state: &Value| {
        let colour = state["last_answer"].as_str().unwrap_or("that");
        LinearPrompt::new([format!("{colour} it is. Thank you for your answer."), "Goodbye!".to_string()])
            .button("Bye 👋")
    });
    vec![welcome, colour, goodbye]
}

pub fn dialogue() -> LinearDialogue {
    LinearDialogue::new(IDENTIFIER, steps())
}

pub fn from_snapshot(snapshot: &DialogueSnapshot) -> ColloquyResult<LinearDialogue> {
    LinearDialogue::from_snapshot(steps(), snapshot)
}
