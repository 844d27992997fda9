//! What a dialogue emits at the end of a turn.
//!
//! A `DialogueOutput` carries the agent messages of one turn, the input mode
//! the dialogue now waits on, the rewind token for that prompt, and a control
//! action telling the coordinator what to do with the dialogue stack.

use std::fmt;

use serde_json::Value;

use colloquy_contracts::{
    attachment::Attachment,
    input::InputMode,
    message::RewindToken,
};

use crate::traits::Dialogue;

/// One agent message of a turn, before the coordinator stamps ids and meta.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputMessage {
    pub body: Option<String>,
    pub attachment: Option<Attachment>,
}

impl OutputMessage {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

impl From<&str> for OutputMessage {
    fn from(body: &str) -> Self {
        Self::text(body)
    }
}

impl From<String> for OutputMessage {
    fn from(body: String) -> Self {
        Self::text(body)
    }
}

impl From<Attachment> for OutputMessage {
    fn from(attachment: Attachment) -> Self {
        Self {
            body: None,
            attachment: Some(attachment),
        }
    }
}

/// Control action applied to the stack after the turn's messages are logged.
pub enum OutputAction {
    /// Keep the emitting dialogue where it is.
    Continue,
    /// Replace the emitting dialogue with the target.
    Transition(Box<dyn Dialogue>),
    /// Push the child on top; the emitter resumes with the child's finish
    /// value once the child is popped.
    Wait(Box<dyn Dialogue>),
    /// Pop the emitting dialogue, handing `value` to whoever waits on it.
    Finish(Option<Value>),
}

impl Default for OutputAction {
    fn default() -> Self {
        Self::Continue
    }
}

impl fmt::Debug for OutputAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputAction::Continue => f.write_str("Continue"),
            OutputAction::Transition(d) => f.debug_tuple("Transition").field(&d.identifier()).finish(),
            OutputAction::Wait(d) => f.debug_tuple("Wait").field(&d.identifier()).finish(),
            OutputAction::Finish(v) => f.debug_tuple("Finish").field(v).finish(),
        }
    }
}

impl OutputAction {
    pub fn name(&self) -> &'static str {
        match self {
            OutputAction::Continue => "continue",
            OutputAction::Transition(_) => "transition",
            OutputAction::Wait(_) => "wait",
            OutputAction::Finish(_) => "finish",
        }
    }
}

/// A dialogue's output for one turn.
#[derive(Debug, Default)]
pub struct DialogueOutput {
    pub messages: Vec<OutputMessage>,
    pub input_mode: Option<InputMode>,
    pub rewind_token: Option<RewindToken>,
    pub action: OutputAction,
}

impl DialogueOutput {
    pub fn new() -> Self {
        Self::default()
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

    pub fn input_mode(mut self, mode: InputMode) -> Self {
        self.input_mode = Some(mode);
        self
    }

    pub fn rewind_token(mut self, token: RewindToken) -> Self {
        self.rewind_token = Some(token);
        self
    }

    pub fn transition_to(mut self, target: Box<dyn Dialogue>) -> Self {
        self.action = OutputAction::Transition(target);
        self
    }

    pub fn wait_for(mut self, child: Box<dyn Dialogue>) -> Self {
        self.action = OutputAction::Wait(child);
        self
    }

    pub fn finish_with(mut self, value: Option<Value>) -> Self {
        self.action = OutputAction::Finish(value);
        self
    }
}
