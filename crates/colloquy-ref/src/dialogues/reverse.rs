//! Revers-o-bot: says everything back to front until told to stop.

use async_trait::async_trait;
use serde_json::Value;

use colloquy_contracts::{
    error::StepError,
    input::{DialogueInput, InputMode},
};
use colloquy_core::DialogueOutput;
use colloquy_script::{HandlerDialogue, HandlerReply, InputHandler};

pub const IDENTIFIER: &str = "reverse";

pub struct ReverseBot;

#[async_trait]
impl InputHandler for ReverseBot {
    async fn greet(&self) -> Result<HandlerReply, StepError> {
        Ok(HandlerReply::reply(
            DialogueOutput::new()
                .message("Hi, I am revers-o-bot! Say anything, and I will reverse it for you.")
                .message("You can say 'stop' to stop the dialogue.")
                .input_mode(InputMode::text()),
        ))
    }

    async fn handle(&self, input: DialogueInput) -> Result<HandlerReply, StepError> {
        match input.as_ref().and_then(Value::as_str).map(str::trim) {
            Some(text) if text.eq_ignore_ascii_case("stop") => {
                Ok(HandlerReply::finish(DialogueOutput::new().message("Bye!")))
            }
            Some(text) => Ok(HandlerReply::reply(
                DialogueOutput::new()
                    .message(text.chars().rev().collect::<String>())
                    .input_mode(InputMode::text()),
            )),
            None => Err(StepError::invalid_input("I can only reverse text.")),
        }
    }
}

pub fn dialogue() -> HandlerDialogue<ReverseBot> {
    HandlerDialogue::new(IDENTIFIER, ReverseBot)
}
