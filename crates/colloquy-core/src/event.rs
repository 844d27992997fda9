//! Change notifications published by the coordinator.

use colloquy_contracts::{error::ColloquyError, message::Message};

/// Messages added to, removed from, or updated in the log by one change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageChanges {
    pub added: Vec<Message>,
    pub removed: Vec<Message>,
    pub updated: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    MessagesChanged(MessageChanges),
    /// The active dialogue started (`true`) or stopped (`false`) processing.
    ActiveChanged(bool),
    DialogueError(ColloquyError),
    DialoguePushed { identifier: String },
    DialogueRemoved { identifier: String },
}
