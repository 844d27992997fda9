//! Onboarding: name, age, and an optional mood check.
//!
//! The name is checked with an `InputValidator` schema, the age with a
//! slider and a range check. Answering yes to the check-in question pushes
//! the mood check and waits for its score.

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use colloquy_contracts::{
    error::{ColloquyResult, StepError},
    input::{Choice, InputMode},
    snapshot::DialogueSnapshot,
    validation::{InputRule, InputRuleType, InputSchema},
};
use colloquy_script::{step_ids, Script, ScriptedDialogue, StepContext, StepOutput, StepResult};
use colloquy_validate::{
    validators::{require_bool, require_in_range, require_non_empty_text},
    InputValidator,
};

use super::{mood, RESUME_PROMPT};

pub const IDENTIFIER: &str = "onboarding";

step_ids! {
    pub enum OnboardingStep {
        Start => "start",
        HandleName => "handle_name",
        AskAge => "ask_age",
        HandleAge => "handle_age",
        HandleCheckIn => "handle_check_in",
        ReportMood => "report_mood",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnboardingState {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub mood_score: Option<f64>,
}

pub type OnboardingDialogue = ScriptedDialogue<OnboardingState, OnboardingStep>;

static SCRIPT: Lazy<Arc<Script<OnboardingState, OnboardingStep>>> = Lazy::new(|| {
    Arc::new(
        Script::new()
            .step(OnboardingStep::Start, start)
            .step(OnboardingStep::HandleName, handle_name)
            .step(OnboardingStep::AskAge, ask_age)
            .step(OnboardingStep::HandleAge, handle_age)
            .step(OnboardingStep::HandleCheckIn, handle_check_in)
            .step(OnboardingStep::ReportMood, report_mood),
    )
});

static NAME_SCHEMA: Lazy<InputSchema> = Lazy::new(|| InputSchema {
    schema_id: "onboarding-name-v1".to_string(),
    json_schema: json!({ "type": "string" }),
    rules: vec![
        InputRule {
            rule_id: "name-length".to_string(),
            description: "Names are at most 40 characters".to_string(),
            rule_type: InputRuleType::MaxLength { max: 40 },
        },
        InputRule {
            rule_id: "no-links".to_string(),
            description: "A name is not a link".to_string(),
            rule_type: InputRuleType::ForbiddenPattern {
                pattern: "://".to_string(),
            },
        },
    ],
    reprompt: "That doesn't look like a name. What should I call you?".to_string(),
});

static VALIDATOR: Lazy<InputValidator> = Lazy::new(InputValidator::new);

pub fn dialogue() -> OnboardingDialogue {
    ScriptedDialogue::new(IDENTIFIER, Arc::clone(&SCRIPT), OnboardingState::default()).with_resume_prompt(RESUME_PROMPT)
}

pub fn from_snapshot(snapshot: &DialogueSnapshot) -> ColloquyResult<OnboardingDialogue> {
    Ok(ScriptedDialogue::from_snapshot(Arc::clone(&SCRIPT), snapshot)?.with_resume_prompt(RESUME_PROMPT))
}

fn yes_no() -> InputMode {
    InputMode::picker([Choice::new("Yes", true), Choice::new("No", false)])
}

// ── Steps ─────────────────────────────────────────────────────────────────────

async fn start(_: StepContext<OnboardingState>) -> StepResult<OnboardingState, OnboardingStep> {
    Ok(StepOutput::text_prompt(
        ["Hi! I'm here to get you set up.", "What's your name?"],
        OnboardingStep::HandleName,
    ))
}

async fn handle_name(ctx: StepContext<OnboardingState>) -> StepResult<OnboardingState, OnboardingStep> {
    let name = require_non_empty_text(&ctx.input, "Please enter your name.")?;
    VALIDATOR.check(&Some(Value::String(name.clone())), &NAME_SCHEMA)?;

    let state = OnboardingState {
        name: Some(name.clone()),
        ..ctx.state
    };
    Ok(StepOutput::new()
        .state(state)
        .message(format!("Nice to meet you, {name}."))
        .next(OnboardingStep::AskAge))
}

async fn ask_age(_: StepContext<OnboardingState>) -> StepResult<OnboardingState, OnboardingStep> {
    Ok(StepOutput::new()
        .message("How old are you?")
        .prompt(InputMode::slider(0.0, 120.0))
        .next(OnboardingStep::HandleAge))
}

async fn handle_age(ctx: StepContext<OnboardingState>) -> StepResult<OnboardingState, OnboardingStep> {
    let age = require_in_range(&ctx.input, 0.0, 120.0, "Please pick an age between 0 and 120.")?;
    let state = OnboardingState {
        age: Some(age.round() as u32),
        ..ctx.state
    };
    Ok(StepOutput::new()
        .state(state)
        .message("Would you like a quick mood check?")
        .prompt(yes_no())
        .next(OnboardingStep::HandleCheckIn))
}

async fn handle_check_in(ctx: StepContext<OnboardingState>) -> StepResult<OnboardingState, OnboardingStep> {
    let wants_check_in = require_bool(&ctx.input, "Please answer yes or no.")?;
    let name = ctx.state.name.clone().unwrap_or_default();

    if wants_check_in {
        Ok(StepOutput::new()
            .message("Great, let's start.")
            .next(OnboardingStep::ReportMood)
            .wait_for(Box::new(mood::dialogue())))
    } else {
        Ok(StepOutput::finish([format!("All set, {name}. See you soon!")]))
    }
}

async fn report_mood(ctx: StepContext<OnboardingState>) -> StepResult<OnboardingState, OnboardingStep> {
    let name = ctx.state.name.clone().unwrap_or_default();
    let Some(score) = ctx.input.as_ref().and_then(Value::as_f64) else {
        return Err(StepError::failed("mood check finished without a score"));
    };

    let state = OnboardingState {
        mood_score: Some(score),
        ..ctx.state
    };
    Ok(StepOutput::finish([
        format!("Thanks, {name}. Your mood score is {score}."),
        "You're all set!".to_string(),
    ])
    .state(state))
}
