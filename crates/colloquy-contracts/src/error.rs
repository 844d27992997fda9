//! Error types for the colloquy engine.
//!
//! Fallible engine operations return `ColloquyResult<T>`. Step bodies return
//! `StepError`, which the step engine either turns into a reprompt
//! (`InvalidInput`) or surfaces as `ColloquyError::StepFailed`.
//!
//! Both enums carry only `String` context so they can be cloned onto the
//! coordinator's change-event channel.

use thiserror::Error;

/// The unified error type for the colloquy engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ColloquyError {
    /// `start` was called on a coordinator with an empty dialogue stack.
    #[error("cannot start: no dialogue on the stack")]
    NoDialogues,

    /// Undo referenced a message id that is not a user message in the log.
    #[error("user message '{id}' not found in the message log")]
    MessageNotFound { id: String },

    /// No agent message with a rewind token precedes the message to undo.
    #[error("no rewind token precedes message '{id}'")]
    MissingRewindToken { id: String },

    /// The prompt answered by the message was marked non-undoable.
    #[error("the prompt answered by message '{id}' can no longer be undone")]
    NotUndoable { id: String },

    /// Undo targeted a message that belongs to a dialogue other than the
    /// active one.
    #[error("cannot undo a message of dialogue '{owner}' while '{active}' is active")]
    CrossDialogueUndo { owner: String, active: String },

    /// The active dialogue does not implement rewinding.
    #[error("dialogue '{dialogue}' does not support rewinding")]
    RewindUnsupported { dialogue: String },

    /// A step name (from a rewind token, snapshot, or chain) is not in the script.
    #[error("step '{step}' does not exist in dialogue '{dialogue}'")]
    UnknownStep { dialogue: String, step: String },

    /// A step body failed with something other than invalid input.
    #[error("step '{step}' of dialogue '{dialogue}' failed: {reason}")]
    StepFailed {
        dialogue: String,
        step: String,
        reason: String,
    },

    /// A lifecycle hook (start, interrupt, resume, finish) failed.
    #[error("'{hook}' hook of dialogue '{dialogue}' failed: {reason}")]
    HookFailed {
        dialogue: String,
        hook: String,
        reason: String,
    },

    /// A middleware before/after hook failed or is misconfigured.
    #[error("middleware '{middleware}' failed: {reason}")]
    MiddlewareFailed { middleware: String, reason: String },

    /// The coordinator is in the middle of processing and cannot take the
    /// requested operation.
    #[error("coordinator is busy processing a dialogue turn")]
    Busy,

    /// A snapshot is malformed or of an unsupported version.
    #[error("invalid snapshot: {reason}")]
    InvalidSnapshot { reason: String },

    /// A hydrator could not rebuild a dialogue from its snapshot.
    #[error("cannot hydrate dialogue '{identifier}': {reason}")]
    Hydration { identifier: String, reason: String },

    /// A factory was asked for an identifier it does not know.
    #[error("unknown dialogue identifier '{identifier}'")]
    UnknownDialogue { identifier: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The snapshot journal could not be written, read, or failed integrity.
    #[error("journal error: {reason}")]
    JournalError { reason: String },
}

/// Convenience alias used throughout the colloquy crates.
pub type ColloquyResult<T> = Result<T, ColloquyError>;

/// What a step body can fail with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    /// The user's input was not acceptable. `message` is shown as a reprompt
    /// and the same step waits for another answer.
    #[error("{message}")]
    InvalidInput { message: String },

    /// Anything else. Reported through the dialogue's error hook.
    #[error("{reason}")]
    Failed { reason: String },
}

impl StepError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}
