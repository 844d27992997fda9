//! Hash-chain primitives.
//!
//! Hash input layout (bytes, in order):
//!   1. conversation id as its 16 raw UUID bytes
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. canonical JSON of the snapshot (serde_json, no pretty-printing)

use sha2::{Digest, Sha256};

use colloquy_contracts::snapshot::{ConversationId, ConversationSnapshot};

use crate::event::JournalEntry;

/// Compute the SHA-256 hash of one journal entry as lowercase hex.
///
/// # Panics
///
/// Panics if `snapshot` cannot be serialized to JSON, which cannot happen
/// for `ConversationSnapshot`.
pub fn hash_entry(
    conversation_id: &ConversationId,
    sequence: u64,
    snapshot: &ConversationSnapshot,
    prev_hash: &str,
) -> String {
    let snapshot_json =
        serde_json::to_vec(snapshot).expect("ConversationSnapshot must always be serializable to JSON");

    let mut hasher = Sha256::new();
    hasher.update(conversation_id.0.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&snapshot_json);

    hex::encode(hasher.finalize())
}

/// Verify linkage and hash correctness of every entry.
///
/// Sequences must also run 0, 1, 2, … without gaps. An empty chain is valid.
pub fn verify_chain(entries: &[JournalEntry]) -> bool {
    let mut expected_prev = JournalEntry::GENESIS_HASH.to_string();

    for (index, entry) in entries.iter().enumerate() {
        if entry.sequence != index as u64 || entry.prev_hash != expected_prev {
            return false;
        }

        let recomputed = hash_entry(&entry.conversation_id, entry.sequence, &entry.snapshot, &entry.prev_hash);
        if entry.this_hash != recomputed {
            return false;
        }

        expected_prev = entry.this_hash.clone();
    }

    true
}
