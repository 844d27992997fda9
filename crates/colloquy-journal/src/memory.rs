//! In-memory `SnapshotStore` backed by a SHA-256 hash chain.
//!
//! `InMemoryJournal` keeps every snapshot saved for one conversation. Use
//! `export_journal()` to take a sealed copy out (e.g. to write it to disk)
//! and `from_journal()` to bring one back; both ends verify the chain.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info, warn};

use colloquy_contracts::{
    error::{ColloquyError, ColloquyResult},
    snapshot::{ConversationId, ConversationSnapshot},
};
use colloquy_core::SnapshotStore;

use crate::{
    chain::{hash_entry, verify_chain},
    event::{Journal, JournalEntry},
};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct JournalState {
    pub(crate) entries: Vec<JournalEntry>,

    /// The `this_hash` of the last entry, or `GENESIS_HASH`.
    pub(crate) last_hash: String,
}

// ── Public journal ────────────────────────────────────────────────────────────

pub struct InMemoryJournal {
    conversation_id: ConversationId,
    pub(crate) state: Arc<Mutex<JournalState>>,
}

impl InMemoryJournal {
    /// An empty journal for `conversation_id`.
    pub fn new(conversation_id: ConversationId) -> Self {
        let state = JournalState {
            entries: Vec::new(),
            last_hash: JournalEntry::GENESIS_HASH.to_string(),
        };
        Self {
            conversation_id,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Rebuild a journal from an exported one.
    ///
    /// Fails with `JournalError` if the chain does not verify, if an entry
    /// belongs to another conversation, or if `terminal_hash` does not match
    /// the last entry.
    pub fn from_journal(journal: Journal) -> ColloquyResult<Self> {
        if journal.entries.iter().any(|e| e.conversation_id != journal.conversation_id) {
            return Err(ColloquyError::JournalError {
                reason: format!("journal {} holds entries of another conversation", journal.conversation_id),
            });
        }
        if !verify_chain(&journal.entries) {
            return Err(ColloquyError::JournalError {
                reason: format!("journal {} failed hash-chain verification", journal.conversation_id),
            });
        }

        let last_hash = journal
            .entries
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_else(|| JournalEntry::GENESIS_HASH.to_string());
        let expected_terminal = journal.entries.last().map(|e| e.this_hash.as_str()).unwrap_or("");
        if journal.terminal_hash != expected_terminal {
            return Err(ColloquyError::JournalError {
                reason: format!("journal {} terminal hash does not match its last entry", journal.conversation_id),
            });
        }

        info!(
            conversation = %journal.conversation_id,
            entry_count = journal.entries.len(),
            "journal loaded"
        );
        Ok(Self {
            conversation_id: journal.conversation_id,
            state: Arc::new(Mutex::new(JournalState {
                entries: journal.entries,
                last_hash,
            })),
        })
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    /// Number of saved snapshots.
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A sealed copy of every entry saved so far.
    pub fn export_journal(&self) -> ColloquyResult<Journal> {
        let state = self.lock()?;
        Ok(Journal {
            conversation_id: self.conversation_id,
            entries: state.entries.clone(),
            exported_at: Utc::now(),
            terminal_hash: state.entries.last().map(|e| e.this_hash.clone()).unwrap_or_default(),
        })
    }

    /// Whether the stored chain is intact.
    pub fn verify_integrity(&self) -> bool {
        self.lock().map(|state| verify_chain(&state.entries)).unwrap_or(false)
    }

    fn lock(&self) -> ColloquyResult<std::sync::MutexGuard<'_, JournalState>> {
        self.state.lock().map_err(|e| ColloquyError::JournalError {
            reason: format!("journal state lock poisoned: {}", e),
        })
    }
}

// ── SnapshotStore impl ────────────────────────────────────────────────────────

impl SnapshotStore for InMemoryJournal {
    /// Append `snapshot` to the chain and return its sequence number.
    fn save(&self, snapshot: &ConversationSnapshot) -> ColloquyResult<u64> {
        if snapshot.id != self.conversation_id {
            return Err(ColloquyError::JournalError {
                reason: format!(
                    "snapshot of conversation {} cannot be saved in journal {}",
                    snapshot.id, self.conversation_id
                ),
            });
        }

        let mut state = self.lock()?;
        let prev_hash = state.last_hash.clone();
        let sequence = state.entries.len() as u64;
        let this_hash = hash_entry(&self.conversation_id, sequence, snapshot, &prev_hash);

        state.entries.push(JournalEntry {
            sequence,
            conversation_id: self.conversation_id,
            snapshot: snapshot.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.last_hash = this_hash;

        debug!(conversation = %self.conversation_id, sequence, "snapshot journaled");
        Ok(sequence)
    }

    /// The last saved snapshot. Refuses to answer from a tampered chain.
    fn load_latest(&self, conversation: &ConversationId) -> ColloquyResult<Option<ConversationSnapshot>> {
        if *conversation != self.conversation_id {
            return Ok(None);
        }
        let state = self.lock()?;
        if !verify_chain(&state.entries) {
            warn!(conversation = %self.conversation_id, "journal chain is broken; refusing to load");
            return Err(ColloquyError::JournalError {
                reason: format!("journal {} failed hash-chain verification", self.conversation_id),
            });
        }
        Ok(state.entries.last().map(|e| e.snapshot.clone()))
    }
}
