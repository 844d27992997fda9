//! Scripts: the step registry of a scripted dialogue.
//!
//! A `Script` maps each `StepId` to an async step function. A step receives
//! a `StepContext` (the user input, a copy of the dialogue state, the active
//! input mode) and returns a `StepOutput` describing the new state, the
//! messages to emit, the next step, and the prompt to wait on.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use colloquy_contracts::{
    error::StepError,
    input::{Choice, DialogueInput, InputMode},
};
use colloquy_core::{Dialogue, OutputAction, OutputMessage};

use crate::step::StepId;

/// Bounds a dialogue state type must meet.
pub trait DialogueState: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> DialogueState for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

pub type StepResult<S, K> = Result<StepOutput<S, K>, StepError>;

pub type StepFn<S, K> = Arc<dyn Fn(StepContext<S>) -> BoxFuture<'static, StepResult<S, K>> + Send + Sync>;

/// What a step is called with.
#[derive(Debug, Clone)]
pub struct StepContext<S> {
    /// The user's input, or `None` when the step was chained or resumed
    /// without a value.
    pub input: DialogueInput,
    /// A copy of the dialogue state. Return a new state to replace it.
    pub state: S,
    /// The input mode the dialogue was waiting on when the input arrived.
    pub input_mode: Option<InputMode>,
}

impl<S> StepContext<S> {
    /// The input as a string, when it is one.
    pub fn input_str(&self) -> Option<&str> {
        self.input.as_ref().and_then(Value::as_str)
    }
}

/// The result of one step.
#[derive(Debug)]
pub struct StepOutput<S, K> {
    pub state: Option<S>,
    pub messages: Vec<OutputMessage>,
    pub input_mode: Option<InputMode>,
    pub next_step: Option<K>,
    pub action: OutputAction,
}

impl<S, K> Default for StepOutput<S, K> {
    fn default() -> Self {
        Self {
            state: None,
            messages: Vec::new(),
            input_mode: None,
            next_step: None,
            action: OutputAction::Continue,
        }
    }
}

impl<S, K: StepId> StepOutput<S, K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages followed by a free-text prompt answered by `next`.
    pub fn text_prompt<I, M>(messages: I, next: K) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<OutputMessage>,
    {
        Self::new().messages(messages).prompt(InputMode::text()).next(next)
    }

    /// One question with a picker answered by `next`.
    pub fn picker_prompt(
        message: impl Into<OutputMessage>,
        choices: impl IntoIterator<Item = Choice>,
        next: K,
    ) -> Self {
        Self::new().message(message).prompt(InputMode::picker(choices)).next(next)
    }

    /// Final messages; the dialogue finishes without a value.
    pub fn finish<I, M>(messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<OutputMessage>,
    {
        Self::new().messages(messages)
    }

    pub fn state(mut self, state: S) -> Self {
        self.state = Some(state);
        self
    }

    pub fn message(mut self, message: impl Into<OutputMessage>) -> Self {
        self.messages.push(message.into());
        self
    }

    pub fn messages<I, M>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<OutputMessage>,
    {
        self.messages.extend(messages.into_iter().map(Into::into));
        self
    }

    /// Wait for user input through `mode`.
    pub fn prompt(mut self, mode: InputMode) -> Self {
        self.input_mode = Some(mode);
        self
    }

    pub fn next(mut self, step: K) -> Self {
        self.next_step = Some(step);
        self
    }

    pub fn transition_to(mut self, target: Box<dyn Dialogue>) -> Self {
        self.action = OutputAction::Transition(target);
        self
    }

    /// Push `child`; `next` (if set) runs with the child's finish value.
    pub fn wait_for(mut self, child: Box<dyn Dialogue>) -> Self {
        self.action = OutputAction::Wait(child);
        self
    }

    /// Finish the dialogue, handing `value` to a waiting parent.
    pub fn finish_with(mut self, value: impl Into<Value>) -> Self {
        self.action = OutputAction::Finish(Some(value.into()));
        self
    }
}

/// The step registry of one dialogue type. Build it once and share it
/// between instances through an `Arc`.
pub struct Script<S, K> {
    steps: HashMap<K, StepFn<S, K>>,
}

impl<S, K> Default for Script<S, K> {
    fn default() -> Self {
        Self {
            steps: HashMap::new(),
        }
    }
}

impl<S: DialogueState, K: StepId> Script<S, K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the step `id`. Registering the same id twice replaces the
    /// earlier function.
    pub fn step<F, Fut>(mut self, id: K, step: F) -> Self
    where
        F: Fn(StepContext<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StepResult<S, K>> + Send + 'static,
    {
        let boxed: StepFn<S, K> = Arc::new(move |context| Box::pin(step(context)));
        self.steps.insert(id, boxed);
        self
    }

    pub fn get(&self, id: K) -> Option<StepFn<S, K>> {
        self.steps.get(&id).cloned()
    }

    pub fn contains(&self, id: K) -> bool {
        self.steps.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
