//! Serializable conversation and dialogue snapshots.
//!
//! A `ConversationSnapshot` is everything needed to rebuild a coordinator:
//! the message log, whether the conversation started, and one
//! `DialogueSnapshot` per snapshot-capable dialogue on the stack, bottom first.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    input::InputMode,
    message::{InstanceId, Message},
};

/// Current snapshot layout version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Unique identifier of one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub uuid::Uuid);

impl ConversationId {
    /// Create a new, unique conversation ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Persisted form of one dialogue instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueSnapshot {
    /// Identifier used by a hydrator to pick the concrete dialogue type.
    pub identifier: String,
    /// Dialogue-owned state, opaque to the coordinator.
    #[serde(default)]
    pub state: Value,
    /// Name of the step that will consume the next input, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
    /// Input mode the dialogue is currently waiting on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_mode: Option<InputMode>,
}

impl DialogueSnapshot {
    pub fn new(identifier: impl Into<String>, state: Value) -> Self {
        Self {
            identifier: identifier.into(),
            state,
            next_step: None,
            input_mode: None,
        }
    }
}

/// One stack entry: the dialogue snapshot, the instance it belonged to, and
/// the child it is waiting on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackEntrySnapshot {
    pub snapshot: DialogueSnapshot,
    /// Kept so messages logged before the snapshot still match the
    /// hydrated instance. A fresh id is assigned when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<InstanceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiting_for: Option<String>,
}

/// Persisted form of a whole conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSnapshot {
    pub version: u32,
    pub id: ConversationId,
    pub did_start: bool,
    pub message_log: Vec<Message>,
    /// Bottom of the stack first.
    pub dialogues: Vec<StackEntrySnapshot>,
}
