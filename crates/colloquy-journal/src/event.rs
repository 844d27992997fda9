//! Journal entry and sealed journal types.
//!
//! A `JournalEntry` wraps one `ConversationSnapshot` with its position in
//! the chain and the hashes that make tampering detectable. A `Journal` is
//! the exported form of every entry for one conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use colloquy_contracts::snapshot::{ConversationId, ConversationSnapshot};

/// One saved snapshot in the hash chain.
///
/// Changing any hashed field invalidates `this_hash` and every later
/// `prev_hash`, which `verify_chain` detects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in the chain, starting at 0. Returned by `save` as the
    /// snapshot's revision.
    pub sequence: u64,

    pub conversation_id: ConversationId,

    pub snapshot: ConversationSnapshot,

    /// SHA-256 hash (hex) of the previous entry, or `GENESIS_HASH`.
    pub prev_hash: String,

    /// SHA-256 hash (hex) over (conversation_id, sequence, prev_hash,
    /// canonical JSON of snapshot).
    pub this_hash: String,
}

impl JournalEntry {
    /// The `prev_hash` of the first entry in every chain.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// Every saved snapshot of one conversation, in chain order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journal {
    pub conversation_id: ConversationId,

    pub entries: Vec<JournalEntry>,

    /// When the journal was exported.
    pub exported_at: DateTime<Utc>,

    /// `this_hash` of the last entry. Empty when there are no entries.
    pub terminal_hash: String,
}
