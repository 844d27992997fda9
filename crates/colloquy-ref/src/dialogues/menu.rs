//! The branching menu: pick a dialogue and hand the conversation over to it.

use std::sync::Arc;

use once_cell::sync::Lazy;

use colloquy_contracts::{
    error::{ColloquyResult, StepError},
    input::Choice,
    snapshot::DialogueSnapshot,
};
use colloquy_core::DialogueFactory;
use colloquy_script::{step_ids, Script, ScriptedDialogue, StepContext, StepOutput, StepResult};

use crate::registry::ReferenceDialogues;

use super::{mood, onboarding, reverse, tour};

pub const IDENTIFIER: &str = "menu";

step_ids! {
    pub enum MenuStep {
        Start => "start",
        HandleChoice => "handle_choice",
    }
}

pub type MenuDialogue = ScriptedDialogue<(), MenuStep>;

static SCRIPT: Lazy<Arc<Script<(), MenuStep>>> = Lazy::new(|| {
    Arc::new(
        Script::new()
            .step(MenuStep::Start, start)
            .step(MenuStep::HandleChoice, handle_choice),
    )
});

pub fn dialogue() -> MenuDialogue {
    ScriptedDialogue::new(IDENTIFIER, Arc::clone(&SCRIPT), ())
}

pub fn from_snapshot(snapshot: &DialogueSnapshot) -> ColloquyResult<MenuDialogue> {
    ScriptedDialogue::from_snapshot(Arc::clone(&SCRIPT), snapshot)
}

async fn start(_: StepContext<()>) -> StepResult<(), MenuStep> {
    Ok(StepOutput::picker_prompt(
        "Which dialogue would you like to run?",
        [
            Choice::new("Onboarding", onboarding::IDENTIFIER),
            Choice::new("Mood check", mood::IDENTIFIER),
            Choice::new("Revers-o-bot", reverse::IDENTIFIER),
            Choice::new("Waterfall tour", tour::IDENTIFIER),
        ],
        MenuStep::HandleChoice,
    ))
}

async fn handle_choice(ctx: StepContext<()>) -> StepResult<(), MenuStep> {
    let target = ctx
        .input_str()
        .filter(|choice| *choice != IDENTIFIER)
        .and_then(|choice| ReferenceDialogues.create(choice).ok())
        .ok_or_else(|| StepError::invalid_input("That is not a dialogue that I know."))?;
    Ok(StepOutput::new().transition_to(target))
}
