//! # colloquy-core
//!
//! The conversation runtime: the `Dialogue` and `Middleware` traits, the
//! output model dialogues emit, the sink they emit it through, and the
//! `Coordinator` that owns the dialogue stack and the message log.

pub mod busy;
pub mod coordinator;
pub mod event;
pub mod output;
pub mod sink;
pub mod traits;

pub use busy::{BusyFlag, BusyGuard};
pub use coordinator::Coordinator;
pub use event::{CoordinatorEvent, MessageChanges};
pub use output::{DialogueOutput, OutputAction, OutputMessage};
pub use sink::{DialogueEvent, DialogueKey, DialogueSink, SinkReceiver};
pub use traits::{Dialogue, DialogueFactory, DialogueHydrator, Middleware, SnapshotStore};
