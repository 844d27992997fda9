//! Core trait definitions for the colloquy engine.
//!
//! - `Dialogue`         : a participant that owns part of a conversation
//! - `Middleware`       : hooks around every user message and dialogue output
//! - `DialogueHydrator` : rebuilds dialogues from snapshots
//! - `DialogueFactory`  : builds fresh dialogues by identifier
//! - `SnapshotStore`    : persists conversation snapshots
//!
//! The coordinator owns the dialogues it pushes and talks to them only
//! through this trait surface plus the attached `DialogueSink`.

use async_trait::async_trait;
use serde_json::Value;

use colloquy_contracts::{
    error::{ColloquyError, ColloquyResult},
    input::DialogueInput,
    message::{RewindToken, UserInput},
    snapshot::{ConversationId, ConversationSnapshot, DialogueSnapshot},
};

use crate::{coordinator::Coordinator, output::DialogueOutput, sink::DialogueSink};

/// A conversation participant.
///
/// A dialogue reports everything it says through the `DialogueSink` it was
/// attached with. Returning `Err` from a hook is reported by the coordinator
/// as a dialogue error event; it never escapes the coordinator's public API.
#[async_trait]
pub trait Dialogue: Send + Sync {
    /// Identifier naming the dialogue type. Used in message meta, for
    /// hydration, and to match a finished child against its waiting parent.
    fn identifier(&self) -> &str;

    /// Persistable state, or `None` if this dialogue cannot be snapshotted.
    /// Dialogues returning `None` are left out of conversation snapshots.
    fn snapshot(&self) -> Option<DialogueSnapshot>;

    /// Called by the coordinator when the dialogue is pushed.
    fn attach(&mut self, sink: DialogueSink);

    /// Called by the coordinator when the dialogue is removed from the stack.
    fn detach(&mut self);

    /// Begin the conversation from the top.
    async fn on_start(&mut self) -> ColloquyResult<()>;

    /// Handle one user input (or `None` when there is nothing to pass).
    async fn on_receive_input(&mut self, input: DialogueInput) -> ColloquyResult<()>;

    /// Another dialogue is being pushed on top of this one.
    async fn on_interrupt(&mut self) -> ColloquyResult<()> {
        Ok(())
    }

    /// This dialogue is back on top. `value` is the finish value of the
    /// child it was waiting for, when that child is the one that was popped.
    async fn on_resume(&mut self, _value: Option<Value>) -> ColloquyResult<()> {
        Ok(())
    }

    /// The dialogue is about to be popped because it finished.
    async fn on_finish(&mut self) -> ColloquyResult<()> {
        Ok(())
    }

    /// Whether `rewind` is implemented.
    fn can_rewind(&self) -> bool {
        false
    }

    /// Restore the dialogue to the point identified by `token`.
    fn rewind(&mut self, _token: &RewindToken) -> ColloquyResult<()> {
        Err(ColloquyError::RewindUnsupported {
            dialogue: self.identifier().to_string(),
        })
    }
}

/// Hooks invoked around every user message and every dialogue output.
///
/// Middleware may drive the coordinator (interject messages, start dialogues)
/// from either hook. Errors are reported as dialogue error events.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Name used in logs and error reports.
    fn name(&self) -> &str;

    /// Runs in registration order before a user message is logged and
    /// dispatched. Returning `Ok(false)` halts processing of that message.
    async fn before(&self, _input: &UserInput, _coordinator: &mut Coordinator) -> ColloquyResult<bool> {
        Ok(true)
    }

    /// Runs in reverse registration order on every output accepted from the
    /// active dialogue, before its messages are logged.
    async fn after(&self, _output: &DialogueOutput, _coordinator: &mut Coordinator) -> ColloquyResult<()> {
        Ok(())
    }
}

/// Rebuilds a dialogue from its snapshot.
pub trait DialogueHydrator: Send + Sync {
    fn hydrate(&self, snapshot: &DialogueSnapshot) -> ColloquyResult<Box<dyn Dialogue>>;
}

/// Builds a fresh dialogue from its identifier.
pub trait DialogueFactory: Send + Sync {
    fn create(&self, identifier: &str) -> ColloquyResult<Box<dyn Dialogue>>;
}

/// Durable storage for conversation snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Persist a snapshot and return its revision number (0-based).
    fn save(&self, snapshot: &ConversationSnapshot) -> ColloquyResult<u64>;

    /// The most recently saved snapshot of `conversation`, if any.
    fn load_latest(&self, conversation: &ConversationId) -> ColloquyResult<Option<ConversationSnapshot>>;
}
