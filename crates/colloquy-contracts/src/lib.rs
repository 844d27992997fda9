//! # colloquy-contracts
//!
//! Shared types for the colloquy dialogue engine: messages, input modes,
//! attachments, snapshots, validation schemas, configuration and errors.
//!
//! Every crate in the workspace imports from here. No orchestration logic
//! lives in this crate, only data definitions.

pub mod attachment;
pub mod config;
pub mod error;
pub mod input;
pub mod message;
pub mod snapshot;
pub mod validation;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use config::CoordinatorConfig;
    use error::{ColloquyError, StepError};
    use input::{Choice, InputKind, InputMode, Keyboard};
    use message::{AgentMessage, InstanceId, Message, MessageId, MessageMeta, RewindToken, UserInput};
    use serde_json::json;
    use snapshot::{ConversationId, ConversationSnapshot, DialogueSnapshot, StackEntrySnapshot};

    // ── InputMode ────────────────────────────────────────────────────────────

    #[test]
    fn input_mode_without_flag_is_undoable() {
        let mode: InputMode = serde_json::from_value(json!({ "type": "text" })).unwrap();
        assert!(mode.is_undoable, "absent flag must mean undoable");
        assert_eq!(
            mode.kind,
            InputKind::Text {
                keyboard: Keyboard::Default
            }
        );
    }

    #[test]
    fn input_mode_only_explicit_false_disables_undo() {
        let mode: InputMode =
            serde_json::from_value(json!({ "type": "slider", "min": 0.0, "max": 10.0, "isUndoable": false }))
                .unwrap();
        assert!(!mode.is_undoable);
        assert_eq!(mode.kind_name(), "slider");
    }

    #[test]
    fn picker_serializes_flat_with_type_tag() {
        let mode = InputMode::picker([Choice::new("Yes", true), Choice::new("No", false)]).not_undoable();
        let value = serde_json::to_value(&mode).unwrap();
        assert_eq!(value["type"], "picker");
        assert_eq!(value["choices"][1]["body"], "No");
        assert_eq!(value["isUndoable"], false);
        assert_eq!(mode.choices().len(), 2);
    }

    #[test]
    fn choices_of_non_picker_are_empty() {
        assert!(InputMode::text().choices().is_empty());
    }

    // ── Messages ─────────────────────────────────────────────────────────────

    fn agent_message(token: Option<&str>, mode: Option<InputMode>) -> AgentMessage {
        AgentMessage {
            id: MessageId::new(),
            created_at: Utc::now(),
            body: Some("What is your name?".to_string()),
            attachment: None,
            input_mode: mode,
            meta: MessageMeta {
                dialogue: "onboarding".to_string(),
                instance: Some(InstanceId::new()),
                rewind_token: token.map(RewindToken::new),
            },
        }
    }

    #[test]
    fn agent_message_wire_shape() {
        let msg = Message::Agent(agent_message(Some("handle_name"), Some(InputMode::text())));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["author"], "agent");
        assert_eq!(value["_meta"]["dialogue"], "onboarding");
        assert_eq!(value["_meta"]["rewindToken"], "handle_name");
        assert!(value["_meta"]["instance"].is_string());
        assert_eq!(value["inputMode"]["type"], "text");
    }

    #[test]
    fn undoable_prompt_requires_token_and_flag() {
        assert!(agent_message(Some("a"), Some(InputMode::text())).is_undoable_prompt());
        assert!(!agent_message(None, Some(InputMode::text())).is_undoable_prompt());
        assert!(!agent_message(Some("a"), Some(InputMode::text().not_undoable())).is_undoable_prompt());
    }

    #[test]
    fn message_ids_are_unique() {
        let ids: std::collections::HashSet<MessageId> = (0..100).map(|_| MessageId::new()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn user_input_dispatches_value_before_body() {
        assert_eq!(UserInput::choice("Yes", true).dispatch_value(), Some(json!(true)));
        assert_eq!(UserInput::text("hi").dispatch_value(), Some(json!("hi")));
        assert_eq!(UserInput::default().dispatch_value(), None);
    }

    // ── Snapshots ────────────────────────────────────────────────────────────

    #[test]
    fn conversation_snapshot_round_trips() {
        let snapshot = ConversationSnapshot {
            version: snapshot::SNAPSHOT_VERSION,
            id: ConversationId::new(),
            did_start: true,
            message_log: vec![Message::Agent(agent_message(Some("handle"), Some(InputMode::text())))],
            dialogues: vec![StackEntrySnapshot {
                snapshot: DialogueSnapshot {
                    identifier: "onboarding".to_string(),
                    state: json!({ "name": null }),
                    next_step: Some("handle".to_string()),
                    input_mode: Some(InputMode::text()),
                },
                instance: None,
                waiting_for: None,
            }],
        };
        let text = serde_json::to_string(&snapshot).unwrap();
        let decoded: ConversationSnapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, snapshot);
        assert_eq!(serde_json::to_string(&decoded).unwrap(), text);
    }

    // ── Config ───────────────────────────────────────────────────────────────

    #[test]
    fn empty_config_uses_defaults() {
        let config = CoordinatorConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoordinatorConfig::default());
        assert!(!config.debug_mode);
    }

    #[test]
    fn config_reads_debug_mode() {
        let config = CoordinatorConfig::from_toml_str("debug_mode = true\ndebug_prefix = \"[DBG]\"").unwrap();
        assert!(config.debug_mode);
        assert_eq!(config.debug_prefix, "[DBG]");
    }

    #[test]
    fn malformed_config_is_config_error() {
        let err = CoordinatorConfig::from_toml_str("debug_mode = ").unwrap_err();
        assert!(matches!(err, ColloquyError::ConfigError { .. }));
    }

    // ── Errors ───────────────────────────────────────────────────────────────

    #[test]
    fn cross_dialogue_undo_display() {
        let err = ColloquyError::CrossDialogueUndo {
            owner: "help".to_string(),
            active: "onboarding".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("help"));
        assert!(msg.contains("onboarding"));
    }

    #[test]
    fn step_error_displays_its_message() {
        assert_eq!(StepError::invalid_input("Please enter a number").to_string(), "Please enter a number");
        assert_eq!(StepError::failed("db down").to_string(), "db down");
    }
}
