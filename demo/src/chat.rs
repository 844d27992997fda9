//! Interactive chat over the reference dialogues.
//!
//! Picker prompts are shown as numbered choices; typing the number (or the
//! label) picks it. Slider prompts accept a number. Commands:
//!
//!   /undo      take back your last message
//!   /snapshot  print the conversation snapshot as JSON
//!   /quit      leave

use std::{path::PathBuf, sync::Arc};

use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use colloquy_contracts::{
    config::CoordinatorConfig,
    error::{ColloquyError, ColloquyResult},
    input::{InputKind, InputMode},
    message::UserInput,
};
use colloquy_core::{Coordinator, CoordinatorEvent, DialogueFactory, SnapshotStore};
use colloquy_journal::{InMemoryJournal, Journal};
use colloquy_middleware::{KeywordMiddleware, TracingMiddleware};
use colloquy_ref::{
    keyword_middleware,
    scenarios::{last_user_message_id, Transcript},
    ReferenceDialogues,
};

pub struct ChatOptions {
    pub dialogue: String,
    pub journal: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub keywords: Option<PathBuf>,
}

pub async fn run(options: ChatOptions) -> ColloquyResult<()> {
    let config = match &options.config {
        Some(path) => CoordinatorConfig::from_file(path)?,
        None => CoordinatorConfig::default(),
    };
    let keywords = match &options.keywords {
        Some(path) => KeywordMiddleware::from_file(path)?.with_factory(Arc::new(ReferenceDialogues)),
        None => keyword_middleware()?,
    };

    let (mut coordinator, journal) = open(&options, config)?;
    coordinator.add_middleware(Arc::new(keywords));
    coordinator.add_middleware(Arc::new(TracingMiddleware));
    let mut events = coordinator.subscribe();

    println!("Type /undo, /snapshot or /quit at any time.");
    println!();

    let mut transcript = Transcript::new();
    coordinator.start().await?;
    transcript.print_new(&coordinator);
    print_choices(coordinator.active_input_mode());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" => break,
            "/snapshot" => {
                let snapshot = serde_json::to_string_pretty(&coordinator.snapshot()).map_err(|e| {
                    ColloquyError::InvalidSnapshot {
                        reason: format!("failed to serialize snapshot: {e}"),
                    }
                })?;
                println!("{snapshot}");
                continue;
            }
            "/undo" => {
                let before = coordinator.message_log().len();
                match last_user_message_id(&coordinator).and_then(|id| coordinator.undo_user_message(id)) {
                    Ok(()) => {
                        println!("  (removed {} message(s))", before - coordinator.message_log().len());
                        if let Some(prompt) = coordinator.message_log().last() {
                            println!("  {}", colloquy_ref::scenarios::render_message(prompt));
                        }
                    }
                    Err(e) => println!("  (cannot undo: {e})"),
                }
                transcript.print_new(&coordinator);
            }
            text => {
                let input = to_user_input(text, coordinator.active_input_mode());
                coordinator.send_user_message(input).await;
                transcript.print_new(&coordinator);
            }
        }

        while let Ok(event) = events.try_recv() {
            if let CoordinatorEvent::DialogueError(error) = event {
                println!("  ! {error}");
            }
        }
        save(&coordinator, &journal, options.journal.as_ref())?;

        if coordinator.stack().is_empty() {
            println!();
            println!("(conversation finished)");
            break;
        }
        print_choices(coordinator.active_input_mode());
    }

    Ok(())
}

/// Resume from the journal file when it exists, else start `options.dialogue`.
fn open(options: &ChatOptions, config: CoordinatorConfig) -> ColloquyResult<(Coordinator, InMemoryJournal)> {
    if let Some(path) = options.journal.as_ref().filter(|p| p.exists()) {
        let text = std::fs::read_to_string(path).map_err(|e| ColloquyError::JournalError {
            reason: format!("failed to read journal '{}': {}", path.display(), e),
        })?;
        let exported: Journal = serde_json::from_str(&text).map_err(|e| ColloquyError::JournalError {
            reason: format!("failed to parse journal '{}': {}", path.display(), e),
        })?;
        let journal = InMemoryJournal::from_journal(exported)?;
        if let Some(snapshot) = journal.load_latest(&journal.conversation_id())? {
            info!(journal = %path.display(), snapshots = journal.len(), "resuming conversation");
            println!("Resuming conversation from {}", path.display());
            let coordinator = Coordinator::from_snapshot(config, snapshot, &ReferenceDialogues)?;
            return Ok((coordinator, journal));
        }
    }

    let root = ReferenceDialogues.create(&options.dialogue)?;
    let coordinator = Coordinator::with_root(config, root);
    let journal = InMemoryJournal::new(coordinator.id());
    Ok((coordinator, journal))
}

fn save(coordinator: &Coordinator, journal: &InMemoryJournal, path: Option<&PathBuf>) -> ColloquyResult<()> {
    journal.save(&coordinator.snapshot())?;
    let Some(path) = path else {
        return Ok(());
    };
    let text = serde_json::to_string_pretty(&journal.export_journal()?).map_err(|e| ColloquyError::JournalError {
        reason: format!("failed to serialize journal: {e}"),
    })?;
    std::fs::write(path, text).map_err(|e| ColloquyError::JournalError {
        reason: format!("failed to write journal '{}': {}", path.display(), e),
    })
}

fn print_choices(mode: Option<&InputMode>) {
    if let Some(InputKind::Picker { choices }) = mode.map(|m| &m.kind) {
        let listed: Vec<String> = choices
            .iter()
            .enumerate()
            .map(|(index, choice)| format!("{}) {}", index + 1, choice.body))
            .collect();
        println!("       {}", listed.join("   "));
    }
}

/// Turn a typed line into user input for the active prompt.
fn to_user_input(text: &str, mode: Option<&InputMode>) -> UserInput {
    match mode.map(|m| &m.kind) {
        Some(InputKind::Picker { choices }) => {
            let by_number = text
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|index| choices.get(index));
            let by_label = || choices.iter().find(|c| c.body.eq_ignore_ascii_case(text));
            match by_number.or_else(by_label) {
                Some(choice) => UserInput::choice(choice.body.clone(), choice.value.clone()),
                None => UserInput::text(text),
            }
        }
        Some(InputKind::Slider { .. }) => match text.parse::<f64>() {
            Ok(number) => UserInput::choice(text, json!(number)),
            Err(_) => UserInput::text(text),
        },
        _ => UserInput::text(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use colloquy_contracts::input::Choice;

    fn yes_no() -> InputMode {
        InputMode::picker([Choice::new("Yes", true), Choice::new("No", false)])
    }

    #[test]
    fn picker_accepts_numbers_and_labels() {
        let mode = yes_no();
        assert_eq!(to_user_input("2", Some(&mode)).value, Some(json!(false)));
        assert_eq!(to_user_input("yes", Some(&mode)).value, Some(json!(true)));
        assert_eq!(to_user_input("yes", Some(&mode)).body.as_deref(), Some("Yes"));
        assert_eq!(to_user_input("0", Some(&mode)).value, None);
        assert_eq!(to_user_input("maybe", Some(&mode)).body.as_deref(), Some("maybe"));
    }

    #[test]
    fn slider_sends_numbers() {
        let mode = InputMode::slider(0.0, 120.0);
        assert_eq!(to_user_input("36", Some(&mode)).value, Some(json!(36.0)));
        assert_eq!(to_user_input("old", Some(&mode)).value, None);
    }

    #[test]
    fn text_stays_text() {
        assert_eq!(to_user_input("2", Some(&InputMode::text())).value, None);
        assert_eq!(to_user_input("hi", None).body.as_deref(), Some("hi"));
    }
}
