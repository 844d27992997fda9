//! Scripted conversations over the reference dialogues.
//!
//! Each scenario drives a real `Coordinator` with canned user input and
//! prints the transcript as it grows.

pub mod help_interrupt;
pub mod snapshot_resume;
pub mod undo;

use colloquy_contracts::{
    error::{ColloquyError, ColloquyResult},
    input::InputKind,
    message::{Message, MessageId, SYSTEM_DIALOGUE_IDENTIFIER},
};
use colloquy_core::Coordinator;

/// Prints the part of a coordinator's log not printed yet.
pub struct Transcript {
    printed: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self { printed: 0 }
    }

    pub fn print_new(&mut self, coordinator: &Coordinator) {
        let log = coordinator.message_log();
        if self.printed > log.len() {
            self.printed = log.len();
        }
        for message in &log[self.printed..] {
            println!("  {}", render_message(message));
        }
        self.printed = log.len();
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

/// One line per message, with picker choices listed after agent prompts.
pub fn render_message(message: &Message) -> String {
    match message {
        Message::User(user) => format!("you  > {}", user.body.as_deref().unwrap_or("")),
        Message::Agent(agent) => {
            let speaker = if agent.meta.dialogue == SYSTEM_DIALOGUE_IDENTIFIER {
                "sys "
            } else {
                "bot "
            };
            let mut line = format!("{speaker} > {}", agent.body.as_deref().unwrap_or(""));
            if let Some(mode) = &agent.input_mode {
                match &mode.kind {
                    InputKind::Picker { choices } => {
                        let labels: Vec<&str> = choices.iter().map(|c| c.body.as_str()).collect();
                        line.push_str(&format!("  [{}]", labels.join(" | ")));
                    }
                    InputKind::Slider { min, max } => line.push_str(&format!("  [{min}..{max}]")),
                    InputKind::Text { .. } | InputKind::Custom { .. } => {}
                }
            }
            line
        }
    }
}

/// The newest user message, or `MessageNotFound` when there is none.
pub fn last_user_message_id(coordinator: &Coordinator) -> ColloquyResult<MessageId> {
    coordinator
        .message_log()
        .iter()
        .rev()
        .find_map(Message::as_user)
        .map(|user| user.id)
        .ok_or_else(|| ColloquyError::MessageNotFound {
            id: "<latest user message>".to_string(),
        })
}
