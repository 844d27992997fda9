//! # colloquy-middleware
//!
//! Middleware for the colloquy coordinator.
//!
//! - `KeywordMiddleware` reacts to TOML-configured keywords before a message
//!   reaches the active dialogue: pass, block, reply, or start a dialogue.
//! - `TracingMiddleware` logs every input and output.

pub mod engine;
pub mod logging;
pub mod rule;

pub use engine::KeywordMiddleware;
pub use logging::TracingMiddleware;
pub use rule::{KeywordConfig, KeywordRule, MatchMode, RuleAction};
