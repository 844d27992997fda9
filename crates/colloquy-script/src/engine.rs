//! The step engine: a dialogue driven by a `Script`.
//!
//! A scripted dialogue keeps its state, a pointer to the step that will
//! consume the next input, and the input mode it is waiting on. Running a
//! step emits one output; when the step names a next step but asks for no
//! input, the engine runs that next step immediately with no input. This is
//! how a step performs a silent state update before the real question.
//!
//! Rewind tokens are step names: a prompt answered by step `X` carries the
//! token `X`, and rewinding to it points the dialogue back at `X`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use colloquy_contracts::{
    error::{ColloquyError, ColloquyResult, StepError},
    input::{DialogueInput, InputMode},
    message::RewindToken,
    snapshot::DialogueSnapshot,
};
use colloquy_core::{BusyFlag, Dialogue, DialogueOutput, DialogueSink, OutputAction};

use crate::{
    script::{DialogueState, Script, StepOutput},
    step::StepId,
};

/// Where the engine stands between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// Not started, or waiting for input at the pending step.
    Idle,
    /// A step chain is running.
    Processing,
    /// No pending step is left.
    Finished,
}

pub struct ScriptedDialogue<S, K> {
    identifier: String,
    script: Arc<Script<S, K>>,
    state: S,
    next_step: Option<K>,
    input_mode: Option<InputMode>,
    /// Input mode issued with each next-step pointer, restored on rewind.
    prompts: HashMap<K, InputMode>,
    /// Resting phase; `Processing` is reported from `running`.
    phase: EnginePhase,
    running: BusyFlag,
    /// Set after emitting a wait; the next resume feeds the pending step.
    waiting: bool,
    /// Said before repeating the pending prompt on a plain resume.
    resume_prompt: Option<String>,
    snapshots: bool,
    sink: Option<DialogueSink>,
}

impl<S: DialogueState, K: StepId> ScriptedDialogue<S, K> {
    pub fn new(identifier: impl Into<String>, script: Arc<Script<S, K>>, state: S) -> Self {
        Self {
            identifier: identifier.into(),
            script,
            state,
            next_step: None,
            input_mode: None,
            prompts: HashMap::new(),
            phase: EnginePhase::Idle,
            running: BusyFlag::new(),
            waiting: false,
            resume_prompt: None,
            snapshots: true,
            sink: None,
        }
    }

    /// Rebuild an instance from a snapshot taken by `Dialogue::snapshot`.
    pub fn from_snapshot(script: Arc<Script<S, K>>, snapshot: &DialogueSnapshot) -> ColloquyResult<Self> {
        let state: S = serde_json::from_value(snapshot.state.clone()).map_err(|e| ColloquyError::Hydration {
            identifier: snapshot.identifier.clone(),
            reason: format!("state does not deserialize: {}", e),
        })?;
        let next_step = match snapshot.next_step.as_deref() {
            Some(name) => Some(K::from_name(name).ok_or_else(|| ColloquyError::UnknownStep {
                dialogue: snapshot.identifier.clone(),
                step: name.to_string(),
            })?),
            None => None,
        };

        let mut dialogue = Self::new(snapshot.identifier.clone(), script, state);
        dialogue.next_step = next_step;
        dialogue.input_mode = snapshot.input_mode.clone();
        if let (Some(step), Some(mode)) = (next_step, &snapshot.input_mode) {
            dialogue.prompts.insert(step, mode.clone());
        }
        // A pending step with no prompt can only be waiting on a child.
        dialogue.waiting = next_step.is_some() && snapshot.input_mode.is_none();
        Ok(dialogue)
    }

    /// When resumed without returning from a wait (e.g. after a help
    /// dialogue pushed on top of it finished), say `message` and repeat the
    /// pending prompt.
    pub fn with_resume_prompt(mut self, message: impl Into<String>) -> Self {
        self.resume_prompt = Some(message.into());
        self
    }

    /// Leave this dialogue out of conversation snapshots.
    pub fn without_snapshots(mut self) -> Self {
        self.snapshots = false;
        self
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn next_step(&self) -> Option<K> {
        self.next_step
    }

    pub fn input_mode(&self) -> Option<&InputMode> {
        self.input_mode.as_ref()
    }

    pub fn phase(&self) -> EnginePhase {
        if self.running.is_set() {
            EnginePhase::Processing
        } else {
            self.phase
        }
    }

    /// Run `first`, then keep running chained steps until one waits for
    /// input or names no next step.
    ///
    /// A chain that is already running is left alone. If the caller drops
    /// this future mid-step, the pointer still names the interrupted step and
    /// the next input runs it again.
    async fn run_chain(&mut self, first: K, input: DialogueInput) -> ColloquyResult<()> {
        let Some(_running) = self.running.try_acquire() else {
            debug!(dialogue = %self.identifier, "step chain already running; input dropped");
            return Ok(());
        };
        self.waiting = false;
        let mut step = first;
        let mut input = input;

        loop {
            self.emit_starting();
            let Some(run) = self.script.get(step) else {
                self.phase = self.resting_phase();
                return Err(ColloquyError::UnknownStep {
                    dialogue: self.identifier.clone(),
                    step: step.name().to_string(),
                });
            };

            debug!(dialogue = %self.identifier, step = step.name(), "running step");
            let context = crate::script::StepContext {
                input: input.take(),
                state: self.state.clone(),
                input_mode: self.input_mode.clone(),
            };

            let (output, reprompt) = match run(context).await {
                Ok(output) => (output, false),
                Err(StepError::InvalidInput { message }) => {
                    debug!(dialogue = %self.identifier, step = step.name(), "invalid input; reprompting");
                    (self.reprompt(message, step), true)
                }
                Err(StepError::Failed { reason }) => {
                    warn!(dialogue = %self.identifier, step = step.name(), %reason, "step failed");
                    self.phase = self.resting_phase();
                    self.emit_error(ColloquyError::StepFailed {
                        dialogue: self.identifier.clone(),
                        step: step.name().to_string(),
                        reason,
                    });
                    return Ok(());
                }
            };

            match self.apply(output, reprompt) {
                Some(next) => step = next,
                None => break,
            }
        }

        self.phase = self.resting_phase();
        Ok(())
    }

    /// Re-issue the active input mode with `message`, pointing back at `step`.
    fn reprompt(&self, message: String, step: K) -> StepOutput<S, K> {
        let mut output = StepOutput::new().message(message).next(step);
        output.input_mode = self.input_mode.clone();
        output
    }

    /// Apply a step's output and emit it. Returns the step to chain into.
    fn apply(&mut self, output: StepOutput<S, K>, reprompt: bool) -> Option<K> {
        let StepOutput {
            state,
            messages,
            input_mode,
            next_step,
            action,
        } = output;

        if let Some(state) = state {
            self.state = state;
        }
        let finishing = matches!(action, OutputAction::Finish(_));
        let suspends = reprompt
            || input_mode.is_some()
            || matches!(action, OutputAction::Transition(_) | OutputAction::Wait(_));
        self.waiting = matches!(action, OutputAction::Wait(_));
        self.next_step = if finishing { None } else { next_step };

        let rewind_token = match (&input_mode, self.next_step) {
            (Some(mode), Some(next)) if mode.is_undoable => Some(RewindToken::new(next.name())),
            _ => None,
        };
        if let (Some(mode), Some(next)) = (&input_mode, self.next_step) {
            self.prompts.insert(next, mode.clone());
        }
        self.input_mode = input_mode.clone();

        let is_finished = self.next_step.is_none();
        self.emit_output(
            DialogueOutput {
                messages,
                input_mode,
                rewind_token,
                action,
            },
            is_finished,
        );

        match self.next_step {
            Some(next) if !suspends => Some(next),
            _ => None,
        }
    }

    fn resting_phase(&self) -> EnginePhase {
        if self.next_step.is_some() {
            EnginePhase::Idle
        } else {
            EnginePhase::Finished
        }
    }

    fn emit_starting(&self) {
        if let Some(sink) = &self.sink {
            sink.output_starting();
        }
    }

    fn emit_output(&self, output: DialogueOutput, is_finished: bool) {
        match &self.sink {
            Some(sink) => sink.output(output, is_finished),
            None => debug!(dialogue = %self.identifier, "no sink attached; output dropped"),
        }
    }

    fn emit_error(&self, error: ColloquyError) {
        if let Some(sink) = &self.sink {
            sink.error(error);
        }
    }
}

#[async_trait]
impl<S: DialogueState, K: StepId> Dialogue for ScriptedDialogue<S, K> {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn snapshot(&self) -> Option<DialogueSnapshot> {
        if !self.snapshots {
            return None;
        }
        let state = match serde_json::to_value(&self.state) {
            Ok(state) => state,
            Err(e) => {
                warn!(dialogue = %self.identifier, error = %e, "state is not serializable; snapshot skipped");
                return None;
            }
        };
        Some(DialogueSnapshot {
            identifier: self.identifier.clone(),
            state,
            next_step: self.next_step.map(|step| step.name().to_string()),
            input_mode: self.input_mode.clone(),
        })
    }

    fn attach(&mut self, sink: DialogueSink) {
        self.sink = Some(sink);
    }

    fn detach(&mut self) {
        self.sink = None;
    }

    async fn on_start(&mut self) -> ColloquyResult<()> {
        self.run_chain(K::START, None).await
    }

    async fn on_receive_input(&mut self, input: DialogueInput) -> ColloquyResult<()> {
        match self.next_step {
            Some(step) => self.run_chain(step, input).await,
            None => {
                debug!(dialogue = %self.identifier, "no pending step; input ignored");
                Ok(())
            }
        }
    }

    async fn on_resume(&mut self, value: Option<Value>) -> ColloquyResult<()> {
        if !self.waiting {
            if let (Some(message), Some(mode), Some(next)) =
                (self.resume_prompt.clone(), self.input_mode.clone(), self.next_step)
            {
                debug!(dialogue = %self.identifier, step = next.name(), "repeating pending prompt");
                let rewind_token = mode.is_undoable.then(|| RewindToken::new(next.name()));
                self.emit_starting();
                self.emit_output(
                    DialogueOutput {
                        messages: vec![message.into()],
                        input_mode: Some(mode),
                        rewind_token,
                        action: OutputAction::Continue,
                    },
                    false,
                );
            }
            return Ok(());
        }
        match self.next_step {
            Some(step) => self.run_chain(step, value).await,
            None => {
                self.waiting = false;
                Ok(())
            }
        }
    }

    fn can_rewind(&self) -> bool {
        true
    }

    fn rewind(&mut self, token: &RewindToken) -> ColloquyResult<()> {
        let step = K::from_name(token.as_str())
            .filter(|step| self.script.contains(*step))
            .ok_or_else(|| ColloquyError::UnknownStep {
                dialogue: self.identifier.clone(),
                step: token.to_string(),
            })?;
        debug!(dialogue = %self.identifier, step = step.name(), "rewinding");
        self.next_step = Some(step);
        self.input_mode = self.prompts.get(&step).cloned();
        self.phase = EnginePhase::Idle;
        self.waiting = false;
        Ok(())
    }
}
