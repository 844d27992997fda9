//! Conversation messages and the identifiers attached to them.
//!
//! The message log is an ordered list of `Message`s. Agent messages record
//! which dialogue produced them and, on the last message of a turn, the
//! rewind token that lets the user undo their answer to that prompt.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{attachment::Attachment, input::InputMode};

/// Dialogue identifier reserved for messages interjected by the coordinator.
pub const SYSTEM_DIALOGUE_IDENTIFIER: &str = "_system";

/// Unique identifier of a single message in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub uuid::Uuid);

impl MessageId {
    /// Create a new, unique message ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of one pushed dialogue instance.
///
/// Dialogue identifiers name a dialogue type, so two pushes of "help" share
/// one. The instance id tells them apart in the message log and in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub uuid::Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque value a dialogue hands back to itself in order to rewind.
///
/// The step engine uses the name of the step that was about to consume the
/// user's answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewindToken(pub String);

impl RewindToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RewindToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bookkeeping attached to every agent message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMeta {
    /// Identifier of the dialogue that produced the message.
    pub dialogue: String,
    /// The pushed instance that produced the message. `None` for
    /// coordinator interjections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<InstanceId>,
    /// Present only on the last message of an undoable turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewind_token: Option<RewindToken>,
}

/// A message written by a dialogue (or by the coordinator itself).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMessage {
    pub id: MessageId,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_mode: Option<InputMode>,
    #[serde(rename = "_meta")]
    pub meta: MessageMeta,
}

impl AgentMessage {
    /// True when this message's prompt can still be undone.
    pub fn is_undoable_prompt(&self) -> bool {
        self.meta.rewind_token.is_some()
            && self.input_mode.as_ref().map_or(true, |m| m.is_undoable)
    }
}

/// A message written by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessage {
    pub id: MessageId,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    /// Whether the prompt this message answered carried a rewind token.
    pub is_undoable: bool,
}

/// One entry of the message log, tagged by `author`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "author", rename_all = "camelCase")]
pub enum Message {
    Agent(AgentMessage),
    User(UserMessage),
}

impl Message {
    pub fn id(&self) -> MessageId {
        match self {
            Message::Agent(m) => m.id,
            Message::User(m) => m.id,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            Message::Agent(m) => m.body.as_deref(),
            Message::User(m) => m.body.as_deref(),
        }
    }

    pub fn as_agent(&self) -> Option<&AgentMessage> {
        match self {
            Message::Agent(m) => Some(m),
            Message::User(_) => None,
        }
    }

    pub fn as_user(&self) -> Option<&UserMessage> {
        match self {
            Message::User(m) => Some(m),
            Message::Agent(_) => None,
        }
    }
}

/// What the user sends to the coordinator.
///
/// `value` wins over `body` when the coordinator decides what to dispatch to
/// the active dialogue; a picker answer typically carries both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

impl UserInput {
    /// Plain typed text.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::default()
        }
    }

    /// A labelled answer, e.g. a picker choice or a slider position.
    pub fn choice(body: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            body: Some(body.into()),
            value: Some(value.into()),
            attachment: None,
        }
    }

    /// A bare value with no body; nothing is appended to the log.
    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// The value dispatched to the dialogue: `value` if present, else `body`.
    pub fn dispatch_value(&self) -> Option<Value> {
        self.value
            .clone()
            .or_else(|| self.body.clone().map(Value::String))
    }
}
