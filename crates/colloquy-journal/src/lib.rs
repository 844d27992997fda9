//! # colloquy-journal
//!
//! Append-only, SHA-256 hash-chained journal of conversation snapshots.
//!
//! Every snapshot saved through `SnapshotStore::save` is wrapped in a
//! `JournalEntry` that links to the previous entry by hash. Editing any
//! stored snapshot breaks the chain; `load_latest` then refuses to return
//! anything.
//!
//! ```rust,ignore
//! let journal = InMemoryJournal::new(coordinator.id());
//! journal.save(&coordinator.snapshot())?;
//!
//! let snapshot = journal.load_latest(&coordinator.id())?;
//! let exported = journal.export_journal()?;
//! ```

pub mod chain;
pub mod event;
pub mod memory;

pub use chain::{hash_entry, verify_chain};
pub use event::{Journal, JournalEntry};
pub use memory::InMemoryJournal;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use colloquy_contracts::{
        error::ColloquyError,
        message::{AgentMessage, Message, MessageId, MessageMeta},
        snapshot::{ConversationId, ConversationSnapshot, DialogueSnapshot, StackEntrySnapshot, SNAPSHOT_VERSION},
    };
    use colloquy_core::SnapshotStore;

    use super::{verify_chain, InMemoryJournal, JournalEntry};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn make_snapshot(id: ConversationId, body: &str, step: &str) -> ConversationSnapshot {
        ConversationSnapshot {
            version: SNAPSHOT_VERSION,
            id,
            did_start: true,
            message_log: vec![Message::Agent(AgentMessage {
                id: MessageId::new(),
                created_at: Utc::now(),
                body: Some(body.to_string()),
                attachment: None,
                input_mode: None,
                meta: MessageMeta {
                    dialogue: "onboarding".to_string(),
                    instance: None,
                    rewind_token: None,
                },
            })],
            dialogues: vec![StackEntrySnapshot {
                snapshot: DialogueSnapshot {
                    identifier: "onboarding".to_string(),
                    state: json!({ "name": body }),
                    next_step: Some(step.to_string()),
                    input_mode: None,
                },
                instance: None,
                waiting_for: None,
            }],
        }
    }

    fn journal_with(n: usize) -> (ConversationId, InMemoryJournal) {
        let id = ConversationId::new();
        let journal = InMemoryJournal::new(id);
        for i in 0..n {
            journal.save(&make_snapshot(id, &format!("msg-{i}"), "ask_age")).unwrap();
        }
        (id, journal)
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    #[test]
    fn save_returns_increasing_revisions() {
        let id = ConversationId::new();
        let journal = InMemoryJournal::new(id);
        assert_eq!(journal.save(&make_snapshot(id, "a", "s")).unwrap(), 0);
        assert_eq!(journal.save(&make_snapshot(id, "b", "s")).unwrap(), 1);
        assert_eq!(journal.len(), 2);
        assert!(journal.verify_integrity());
    }

    #[test]
    fn load_latest_returns_last_snapshot() {
        let (id, journal) = journal_with(3);
        let latest = journal.load_latest(&id).unwrap().unwrap();
        assert_eq!(latest.message_log[0].body(), Some("msg-2"));
    }

    #[test]
    fn load_latest_empty_or_other_conversation() {
        let (id, journal) = journal_with(0);
        assert!(journal.load_latest(&id).unwrap().is_none());

        let (_, journal) = journal_with(1);
        assert!(journal.load_latest(&ConversationId::new()).unwrap().is_none());
    }

    #[test]
    fn first_entry_links_to_genesis() {
        let (_, journal) = journal_with(2);
        let exported = journal.export_journal().unwrap();
        assert_eq!(exported.entries[0].prev_hash, JournalEntry::GENESIS_HASH);
        assert_eq!(exported.entries[1].prev_hash, exported.entries[0].this_hash);
        assert_eq!(exported.terminal_hash, exported.entries[1].this_hash);
    }

    #[test]
    fn tampering_is_refused() {
        let (id, journal) = journal_with(3);
        {
            let mut state = journal.state.lock().unwrap();
            state.entries[0].snapshot.dialogues[0].snapshot.state = json!({ "name": "TAMPERED" });
        }

        assert!(!journal.verify_integrity());
        assert!(matches!(journal.load_latest(&id), Err(ColloquyError::JournalError { .. })));
    }

    #[test]
    fn saving_another_conversation_fails() {
        let (_, journal) = journal_with(0);
        let stranger = make_snapshot(ConversationId::new(), "x", "s");
        assert!(matches!(journal.save(&stranger), Err(ColloquyError::JournalError { .. })));
        assert!(journal.is_empty());
    }

    #[test]
    fn export_survives_json_and_reloads() {
        let (id, journal) = journal_with(2);
        let text = serde_json::to_string(&journal.export_journal().unwrap()).unwrap();

        let restored = InMemoryJournal::from_journal(serde_json::from_str(&text).unwrap()).unwrap();
        assert_eq!(restored.conversation_id(), id);
        assert_eq!(restored.len(), 2);

        // Appending continues the chain.
        assert_eq!(restored.save(&make_snapshot(id, "more", "s")).unwrap(), 2);
        assert!(restored.verify_integrity());
    }

    #[test]
    fn from_journal_rejects_broken_exports() {
        let (_, journal) = journal_with(2);

        let mut reordered = journal.export_journal().unwrap();
        reordered.entries.swap(0, 1);
        assert!(InMemoryJournal::from_journal(reordered).is_err());

        let mut wrong_terminal = journal.export_journal().unwrap();
        wrong_terminal.terminal_hash = JournalEntry::GENESIS_HASH.to_string();
        assert!(InMemoryJournal::from_journal(wrong_terminal).is_err());
    }

    #[test]
    fn empty_chain_is_valid() {
        assert!(verify_chain(&[]));
        let (_, journal) = journal_with(0);
        assert!(journal.verify_integrity());
        assert_eq!(journal.export_journal().unwrap().terminal_hash, "");
    }
}
