//! A dialogue backed by a single free-form handler.
//!
//! Suited to conversations without a fixed shape: every input goes to the
//! same `InputHandler`, which decides what to say and whether the dialogue
//! is over. Handler dialogues keep no snapshot state and do not rewind.

use async_trait::async_trait;
use tracing::{debug, warn};

use colloquy_contracts::{
    error::{ColloquyError, ColloquyResult, StepError},
    input::{DialogueInput, InputMode},
    snapshot::DialogueSnapshot,
};
use colloquy_core::{Dialogue, DialogueOutput, DialogueSink};

/// One reply of a handler.
#[derive(Debug, Default)]
pub struct HandlerReply {
    pub output: DialogueOutput,
    pub is_finished: bool,
}

impl HandlerReply {
    pub fn reply(output: DialogueOutput) -> Self {
        Self {
            output,
            is_finished: false,
        }
    }

    pub fn finish(output: DialogueOutput) -> Self {
        Self {
            output,
            is_finished: true,
        }
    }
}

#[async_trait]
pub trait InputHandler: Send + Sync {
    /// What to say when the dialogue starts. Says nothing by default.
    async fn greet(&self) -> Result<HandlerReply, StepError> {
        Ok(HandlerReply::default())
    }

    async fn handle(&self, input: DialogueInput) -> Result<HandlerReply, StepError>;
}

pub struct HandlerDialogue<H> {
    identifier: String,
    handler: H,
    sink: Option<DialogueSink>,
}

impl<H: InputHandler> HandlerDialogue<H> {
    pub fn new(identifier: impl Into<String>, handler: H) -> Self {
        Self {
            identifier: identifier.into(),
            handler,
            sink: None,
        }
    }

    fn deliver(&self, result: Result<HandlerReply, StepError>) {
        let Some(sink) = &self.sink else {
            return;
        };
        match result {
            Ok(reply) => sink.output(reply.output, reply.is_finished),
            Err(StepError::InvalidInput { message }) => {
                debug!(dialogue = %self.identifier, "handler rejected input; reprompting");
                sink.output(DialogueOutput::new().message(message).input_mode(InputMode::text()), false);
            }
            Err(StepError::Failed { reason }) => {
                warn!(dialogue = %self.identifier, %reason, "handler failed");
                sink.error(ColloquyError::StepFailed {
                    dialogue: self.identifier.clone(),
                    step: "handle".to_string(),
                    reason,
                });
            }
        }
    }

    fn emit_starting(&self) {
        if let Some(sink) = &self.sink {
            sink.output_starting();
        }
    }
}

#[async_trait]
impl<H: InputHandler> Dialogue for HandlerDialogue<H> {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn snapshot(&self) -> Option<DialogueSnapshot> {
        None
    }

    fn attach(&mut self, sink: DialogueSink) {
        self.sink = Some(sink);
    }

    fn detach(&mut self) {
        self.sink = None;
    }

    async fn on_start(&mut self) -> ColloquyResult<()> {
        self.emit_starting();
        let result = self.handler.greet().await;
        self.deliver(result);
        Ok(())
    }

    async fn on_receive_input(&mut self, input: DialogueInput) -> ColloquyResult<()> {
        self.emit_starting();
        let result = self.handler.handle(input).await;
        self.deliver(result);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{json, Value};

    use colloquy_core::{DialogueEvent, SinkReceiver};

    /// Echoes input backwards until told to stop.
    struct Backwards;

    #[async_trait]
    impl InputHandler for Backwards {
        async fn greet(&self) -> Result<HandlerReply, StepError> {
            Ok(HandlerReply::reply(DialogueOutput::new().message("Say something")))
        }

        async fn handle(&self, input: DialogueInput) -> Result<HandlerReply, StepError> {
            match input.as_ref().and_then(Value::as_str) {
                Some("stop") => Ok(HandlerReply::finish(DialogueOutput::new().message("Bye"))),
                Some("explode") => Err(StepError::failed("kaboom")),
                Some(text) => Ok(HandlerReply::reply(
                    DialogueOutput::new().message(text.chars().rev().collect::<String>()),
                )),
                None => Err(StepError::invalid_input("Text only, please")),
            }
        }
    }

    fn attached() -> (HandlerDialogue<Backwards>, SinkReceiver) {
        let mut dialogue = HandlerDialogue::new("reverse", Backwards);
        let (sink, rx) = DialogueSink::channel();
        dialogue.attach(sink);
        (dialogue, rx)
    }

    #[tokio::test]
    async fn replies_and_finishes() {
        let (mut dialogue, mut rx) = attached();
        dialogue.on_start().await.unwrap();
        dialogue.on_receive_input(Some(json!("hello"))).await.unwrap();
        dialogue.on_receive_input(Some(json!("stop"))).await.unwrap();

        let outputs = rx.outputs();
        let bodies: Vec<_> = outputs.iter().map(|(o, _)| o.messages[0].body.clone().unwrap()).collect();
        assert_eq!(bodies, vec!["Say something", "olleh", "Bye"]);
        assert_eq!(outputs.iter().map(|(_, f)| *f).collect::<Vec<_>>(), vec![false, false, true]);
    }

    #[tokio::test]
    async fn invalid_input_reprompts_with_text() {
        let (mut dialogue, mut rx) = attached();
        dialogue.on_receive_input(Some(json!(12))).await.unwrap();

        let outputs = rx.outputs();
        assert_eq!(outputs[0].0.messages[0].body.as_deref(), Some("Text only, please"));
        assert_eq!(outputs[0].0.input_mode, Some(InputMode::text()));
    }

    #[tokio::test]
    async fn failure_goes_to_error_hook() {
        let (mut dialogue, mut rx) = attached();
        dialogue.on_receive_input(Some(json!("explode"))).await.unwrap();

        let events = rx.drain();
        assert!(matches!(events.last(), Some(DialogueEvent::Error(ColloquyError::StepFailed { .. }))));
        assert!(dialogue.snapshot().is_none());
    }
}
