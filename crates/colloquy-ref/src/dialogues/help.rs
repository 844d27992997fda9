//! The help dialogue, usually pushed over another dialogue by a keyword.

use std::sync::Arc;

use once_cell::sync::Lazy;

use colloquy_contracts::{error::ColloquyResult, input::Choice, snapshot::DialogueSnapshot};
use colloquy_script::{step_ids, Script, ScriptedDialogue, StepContext, StepOutput, StepResult};
use colloquy_validate::validators::{require_bool, require_non_empty_text};

pub const IDENTIFIER: &str = "help";

step_ids! {
    pub enum HelpStep {
        Start => "start",
        Handle => "handle",
        HandleProblem => "handle_problem",
    }
}

pub type HelpDialogue = ScriptedDialogue<(), HelpStep>;

static SCRIPT: Lazy<Arc<Script<(), HelpStep>>> = Lazy::new(|| {
    Arc::new(
        Script::new()
            .step(HelpStep::Start, start)
            .step(HelpStep::Handle, handle)
            .step(HelpStep::HandleProblem, handle_problem),
    )
});

pub fn dialogue() -> HelpDialogue {
    ScriptedDialogue::new(IDENTIFIER, Arc::clone(&SCRIPT), ())
}

pub fn from_snapshot(snapshot: &DialogueSnapshot) -> ColloquyResult<HelpDialogue> {
    ScriptedDialogue::from_snapshot(Arc::clone(&SCRIPT), snapshot)
}

async fn start(_: StepContext<()>) -> StepResult<(), HelpStep> {
    Ok(StepOutput::picker_prompt(
        "Do you need help with something?",
        [Choice::new("Yes", true), Choice::new("No", false)],
        HelpStep::Handle,
    ))
}

async fn handle(ctx: StepContext<()>) -> StepResult<(), HelpStep> {
    if require_bool(&ctx.input, "Please answer yes or no.")? {
        Ok(StepOutput::text_prompt(
            ["No worries, I can help you!", "What is the problem?"],
            HelpStep::HandleProblem,
        ))
    } else {
        Ok(StepOutput::finish(["Ok, let's get back to where we left off."]))
    }
}

async fn handle_problem(ctx: StepContext<()>) -> StepResult<(), HelpStep> {
    let problem = require_non_empty_text(&ctx.input, "Please describe the problem.")?;
    Ok(StepOutput::finish([
        format!("I've noted \"{problem}\". Someone will be in touch."),
        "Let's get back to where we left off.".to_string(),
    ]))
}
