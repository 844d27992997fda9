//! Middleware that traces the conversation.

use async_trait::async_trait;
use tracing::info;

use colloquy_contracts::{error::ColloquyResult, message::UserInput};
use colloquy_core::{Coordinator, DialogueOutput, Middleware};

/// Logs each user input and each accepted dialogue output. Never halts.
#[derive(Debug, Default)]
pub struct TracingMiddleware;

#[async_trait]
impl Middleware for TracingMiddleware {
    fn name(&self) -> &str {
        "tracing"
    }

    async fn before(&self, input: &UserInput, coordinator: &mut Coordinator) -> ColloquyResult<bool> {
        info!(
            conversation = %coordinator.id(),
            active = coordinator.active_dialogue().unwrap_or("-"),
            body = input.body.as_deref().unwrap_or(""),
            value = ?input.value,
            "user input"
        );
        Ok(true)
    }

    async fn after(&self, output: &DialogueOutput, coordinator: &mut Coordinator) -> ColloquyResult<()> {
        info!(
            conversation = %coordinator.id(),
            active = coordinator.active_dialogue().unwrap_or("-"),
            messages = output.messages.len(),
            input_mode = output.input_mode.as_ref().map(|m| m.kind_name()).unwrap_or("-"),
            action = output.action.name(),
            "dialogue output"
        );
        Ok(())
    }
}
