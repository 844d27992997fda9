//! # colloquy-validate
//!
//! Input validation for dialogue steps.
//!
//! `validators` holds the small predicate and `require_*` helpers used inline
//! in step bodies. `engine` holds `InputValidator`, which checks input
//! against an `InputSchema` (JSON Schema plus ordered rules).

pub mod engine;
pub mod validators;

pub use engine::{CustomRuleFn, InputValidator};
