//! # colloquy-ref
//!
//! Reference dialogues for the colloquy engine, and scripted scenarios that
//! drive them through a real coordinator:
//!
//! 1. **Undo**: an answer is taken back and the dialogue rewinds to the
//!    question it answered.
//! 2. **Help interruption**: a keyword pushes the help dialogue over
//!    onboarding, which resumes once help finishes.
//! 3. **Snapshot and resume**: a conversation is journaled, dropped, and
//!    rebuilt from the journal.

use std::sync::Arc;

use colloquy_contracts::error::ColloquyResult;
use colloquy_middleware::KeywordMiddleware;

pub mod dialogues;
pub mod registry;
pub mod scenarios;

pub use registry::ReferenceDialogues;

/// Keyword rules used with the reference dialogues.
pub const REFERENCE_KEYWORDS: &str = include_str!("../keywords/reference.toml");

/// Keyword middleware over `REFERENCE_KEYWORDS`, starting dialogues through
/// `ReferenceDialogues`.
pub fn keyword_middleware() -> ColloquyResult<KeywordMiddleware> {
    Ok(KeywordMiddleware::from_toml_str(REFERENCE_KEYWORDS)?.with_factory(Arc::new(ReferenceDialogues)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
