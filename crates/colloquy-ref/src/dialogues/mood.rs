//! A short mood questionnaire.
//!
//! `ask` shows the question at `state.index`; `record` adds the answer to
//! the total and chains straight back into `ask` without saying anything.
//! After the last question the dialogue finishes with the total score.

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use colloquy_contracts::{
    error::ColloquyResult,
    input::{Choice, InputMode},
    snapshot::DialogueSnapshot,
};
use colloquy_script::{step_ids, Script, ScriptedDialogue, StepContext, StepOutput, StepResult};
use colloquy_validate::validators::require_in_range;

use super::RESUME_PROMPT;

pub const IDENTIFIER: &str = "mood-check";

pub const QUESTIONS: [&str; 3] = [
    "Over the last two weeks, how often have you felt down?",
    "How often have you had little interest in doing things?",
    "How often have you had trouble sleeping?",
];

step_ids! {
    pub enum MoodStep {
        Start => "start",
        Ask => "ask",
        Record => "record",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoodState {
    /// Question to ask next.
    pub index: usize,
    pub total: u32,
}

pub type MoodDialogue = ScriptedDialogue<MoodState, MoodStep>;

static SCRIPT: Lazy<Arc<Script<MoodState, MoodStep>>> = Lazy::new(|| {
    Arc::new(
        Script::new()
            .step(MoodStep::Start, start)
            .step(MoodStep::Ask, ask)
            .step(MoodStep::Record, record),
    )
});

pub fn dialogue() -> MoodDialogue {
    ScriptedDialogue::new(IDENTIFIER, Arc::clone(&SCRIPT), MoodState::default()).with_resume_prompt(RESUME_PROMPT)
}

pub fn from_snapshot(snapshot: &DialogueSnapshot) -> ColloquyResult<MoodDialogue> {
    Ok(ScriptedDialogue::from_snapshot(Arc::clone(&SCRIPT), snapshot)?.with_resume_prompt(RESUME_PROMPT))
}

/// Answers are scored 0 to 3. Undoing an answer would double count it, so
/// the questions are not undoable.
fn answers() -> InputMode {
    InputMode::picker([
        Choice::new("Not at all", 0),
        Choice::new("Several days", 1),
        Choice::new("More than half the days", 2),
        Choice::new("Nearly every day", 3),
    ])
    .not_undoable()
}

async fn start(_: StepContext<MoodState>) -> StepResult<MoodState, MoodStep> {
    Ok(StepOutput::new()
        .message("A few quick questions about how you've been.")
        .next(MoodStep::Ask))
}

async fn ask(ctx: StepContext<MoodState>) -> StepResult<MoodState, MoodStep> {
    match QUESTIONS.get(ctx.state.index) {
        Some(question) => Ok(StepOutput::new().message(*question).prompt(answers()).next(MoodStep::Record)),
        None => Ok(StepOutput::finish(["Thanks for answering."]).finish_with(ctx.state.total)),
    }
}

async fn record(ctx: StepContext<MoodState>) -> StepResult<MoodState, MoodStep> {
    let points = require_in_range(&ctx.input, 0.0, 3.0, "Please pick one of the answers.")?;
    let state = MoodState {
        index: ctx.state.index + 1,
        total: ctx.state.total + points.round() as u32,
    };
    Ok(StepOutput::new().state(state).next(MoodStep::Ask))
}
