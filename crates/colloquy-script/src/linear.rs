//! A fixed, linear sequence of button prompts.
//!
//! Each step shows some messages and one or more buttons. Any answer moves
//! the dialogue to the next step; an answer to the last step finishes it,
//! optionally handing over to a follow-up dialogue. Prompts are never
//! undoable, so the dialogue does not rewind.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use colloquy_contracts::{
    error::{ColloquyError, ColloquyResult},
    input::{Choice, DialogueInput, InputMode},
    snapshot::DialogueSnapshot,
};
use colloquy_core::{Dialogue, DialogueOutput, DialogueSink, OutputMessage};

/// What one step shows.
#[derive(Debug, Clone, Default)]
pub struct LinearPrompt {
    pub messages: Vec<OutputMessage>,
    pub buttons: Vec<String>,
}

impl LinearPrompt {
    pub fn new<I, M>(messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<OutputMessage>,
    {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
            buttons: Vec::new(),
        }
    }

    pub fn button(mut self, label: impl Into<String>) -> Self {
        self.buttons.push(label.into());
        self
    }

    fn into_output(self) -> DialogueOutput {
        let choices = self
            .buttons
            .into_iter()
            .map(|label| Choice::new(label.clone(), label));
        DialogueOutput::new()
            .messages(self.messages)
            .input_mode(InputMode::picker(choices).not_undoable())
    }
}

/// A step reads the shared state (the last answer is stored under
/// `"last_answer"`) and returns what to show.
pub type LinearStep = Arc<dyn Fn(&Value) -> LinearPrompt + Send + Sync>;

pub struct LinearDialogue {
    identifier: String,
    steps: Vec<LinearStep>,
    state: Value,
    next_index: Option<usize>,
    then: Option<Box<dyn Dialogue>>,
    sink: Option<DialogueSink>,
}

impl LinearDialogue {
    pub fn new(identifier: impl Into<String>, steps: Vec<LinearStep>) -> Self {
        Self {
            identifier: identifier.into(),
            steps,
            state: json!({}),
            next_index: None,
            then: None,
            sink: None,
        }
    }

    /// Rebuild from a snapshot. The step list comes from the caller.
    pub fn from_snapshot(steps: Vec<LinearStep>, snapshot: &DialogueSnapshot) -> ColloquyResult<Self> {
        let next_index = match snapshot.next_step.as_deref() {
            Some(name) => Some(
                name.parse::<usize>()
                    .ok()
                    .filter(|index| *index <= steps.len())
                    .ok_or_else(|| ColloquyError::UnknownStep {
                        dialogue: snapshot.identifier.clone(),
                        step: name.to_string(),
                    })?,
            ),
            None => None,
        };
        let mut dialogue = Self::new(snapshot.identifier.clone(), steps);
        dialogue.state = snapshot.state.clone();
        dialogue.next_index = next_index;
        Ok(dialogue)
    }

    /// Transition to `dialogue` once the last step is answered.
    pub fn then(mut self, dialogue: Box<dyn Dialogue>) -> Self {
        self.then = Some(dialogue);
        self
    }

    pub fn next_index(&self) -> Option<usize> {
        self.next_index
    }

    fn run(&mut self, index: usize) {
        let Some(step) = self.steps.get(index).cloned() else {
            return;
        };
        debug!(dialogue = %self.identifier, step = index, "running linear step");
        let output = step(&self.state).into_output();
        self.next_index = Some(index + 1);
        self.emit(output, false);
    }

    fn finish(&mut self) {
        debug!(dialogue = %self.identifier, "linear dialogue complete");
        self.next_index = None;
        let output = match self.then.take() {
            Some(next) => DialogueOutput::new().transition_to(next),
            None => DialogueOutput::new(),
        };
        self.emit(output, true);
    }

    fn emit(&self, output: DialogueOutput, is_finished: bool) {
        if let Some(sink) = &self.sink {
            sink.output_starting();
            sink.output(output, is_finished);
        }
    }
}

#[async_trait]
impl Dialogue for LinearDialogue {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn snapshot(&self) -> Option<DialogueSnapshot> {
        Some(DialogueSnapshot {
            identifier: self.identifier.clone(),
            state: self.state.clone(),
            next_step: self.next_index.map(|index| index.to_string()),
            input_mode: None,
        })
    }

    fn attach(&mut self, sink: DialogueSink) {
        self.sink = Some(sink);
    }

    fn detach(&mut self) {
        self.sink = None;
    }

    async fn on_start(&mut self) -> ColloquyResult<()> {
        if self.steps.is_empty() {
            self.finish();
        } else {
            self.run(0);
        }
        Ok(())
    }

    async fn on_receive_input(&mut self, input: DialogueInput) -> ColloquyResult<()> {
        let Some(index) = self.next_index else {
            debug!(dialogue = %self.identifier, "input after completion ignored");
            return Ok(());
        };
        if let Some(answers) = self.state.as_object_mut() {
            answers.insert("last_answer".to_string(), input.unwrap_or(Value::Null));
        }
        if index < self.steps.len() {
            self.run(index);
        } else {
            self.finish();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use colloquy_core::SinkReceiver;

    fn tour_steps() -> Vec<LinearStep> {
        let welcome: LinearStep = Arc::new(|_: &Value| LinearPrompt::new(["Welcome to the tour"]).button("Next"));
        let echo: LinearStep = Arc::new(|state: &Value| {
            LinearPrompt::new([format!("You said {}", state["last_answer"])])
                .button("Ok")
                .button("Fine")
        });
        vec![welcome, echo]
    }

    fn attached(mut dialogue: LinearDialogue) -> (LinearDialogue, SinkReceiver) {
        let (sink, rx) = DialogueSink::channel();
        dialogue.attach(sink);
        (dialogue, rx)
    }

    #[tokio::test]
    async fn steps_render_as_non_undoable_pickers() {
        let (mut dialogue, mut rx) = attached(LinearDialogue::new("tour", tour_steps()));
        dialogue.on_start().await.unwrap();

        let outputs = rx.outputs();
        let mode = outputs[0].0.input_mode.as_ref().unwrap();
        assert!(!mode.is_undoable);
        assert_eq!(mode.choices()[0].value, json!("Next"));
        assert!(outputs[0].0.rewind_token.is_none());
        assert_eq!(dialogue.next_index(), Some(1));
    }

    #[tokio::test]
    async fn any_answer_advances_and_last_answer_finishes() {
        let (mut dialogue, mut rx) = attached(LinearDialogue::new("tour", tour_steps()));
        dialogue.on_start().await.unwrap();
        dialogue.on_receive_input(Some(json!("Next"))).await.unwrap();
        dialogue.on_receive_input(Some(json!("Ok"))).await.unwrap();

        let outputs = rx.outputs();
        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs[1].0.messages[0].body.as_deref(), Some("You said \"Next\""));
        assert!(outputs[2].1, "answering the last step finishes the dialogue");
        assert_eq!(dialogue.next_index(), None);
        assert!(!dialogue.can_rewind());
    }

    #[tokio::test]
    async fn follow_up_dialogue_is_a_transition() {
        let follow_up = LinearDialogue::new("after", tour_steps());
        let only: LinearStep = Arc::new(|_: &Value| LinearPrompt::new(["Only step"]).button("Done"));
        let (mut dialogue, mut rx) = attached(LinearDialogue::new("tour", vec![only]).then(Box::new(follow_up)));
        dialogue.on_start().await.unwrap();
        dialogue.on_receive_input(Some(json!("Done"))).await.unwrap();

        let outputs = rx.outputs();
        assert!(matches!(&outputs[1].0.action, colloquy_core::OutputAction::Transition(d) if d.identifier() == "after"));
    }

    #[test]
    fn snapshot_keeps_position() {
        let mut snapshot = DialogueSnapshot::new("tour", json!({ "last_answer": "Next" }));
        snapshot.next_step = Some("1".to_string());
        let restored = LinearDialogue::from_snapshot(tour_steps(), &snapshot).unwrap();
        assert_eq!(restored.next_index(), Some(1));

        snapshot.next_step = Some("9".to_string());
        assert!(LinearDialogue::from_snapshot(tour_steps(), &snapshot).is_err());
    }
}
