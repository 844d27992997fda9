//! # colloquy-script
//!
//! Ready-made dialogue implementations:
//!
//! - `ScriptedDialogue`: the step engine, driven by a `Script` of async steps
//! - `LinearDialogue`  : a fixed sequence of button prompts
//! - `HandlerDialogue` : one free-form handler for every input

pub mod engine;
pub mod handler;
pub mod linear;
pub mod script;
pub mod step;

pub use engine::{EnginePhase, ScriptedDialogue};
pub use handler::{HandlerDialogue, HandlerReply, InputHandler};
pub use linear::{LinearDialogue, LinearPrompt, LinearStep};
pub use script::{DialogueState, Script, StepContext, StepOutput, StepResult};
pub use step::StepId;
