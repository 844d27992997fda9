//! TOML-driven keyword middleware.
//!
//! `KeywordMiddleware` loads a `KeywordConfig` from a TOML string or file and
//! implements the `Middleware` before-hook.
//!
//! Evaluation:
//!
//! 1. Messages without a body pass untouched.
//! 2. Rules are tried in declaration order; the first whose keywords match
//!    the body decides the outcome.
//! 3. No matching rule → the message passes (allow by default).

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use tracing::{debug, info};

use colloquy_contracts::{
    error::{ColloquyError, ColloquyResult},
    message::UserInput,
};
use colloquy_core::{Coordinator, DialogueFactory, Middleware};

use crate::rule::{KeywordConfig, KeywordRule, RuleAction};

/// Reacts to keywords in user messages before they reach the active dialogue.
///
/// ```rust,ignore
/// let keywords = KeywordMiddleware::from_file(Path::new("keywords.toml"))?
///     .with_factory(Arc::new(ReferenceDialogues));
/// coordinator.add_middleware(Arc::new(keywords));
/// ```
pub struct KeywordMiddleware {
    config: KeywordConfig,
    factory: Option<Arc<dyn DialogueFactory>>,
}

impl KeywordMiddleware {
    pub fn new(config: KeywordConfig) -> Self {
        Self { config, factory: None }
    }

    /// Parse `s` as TOML keyword configuration.
    ///
    /// Returns `ColloquyError::ConfigError` if the TOML is malformed or does
    /// not match `KeywordConfig`.
    pub fn from_toml_str(s: &str) -> ColloquyResult<Self> {
        let config: KeywordConfig = toml::from_str(s).map_err(|e| ColloquyError::ConfigError {
            reason: format!("failed to parse keyword TOML: {}", e),
        })?;
        Ok(Self::new(config))
    }

    pub fn from_file(path: &Path) -> ColloquyResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ColloquyError::ConfigError {
            reason: format!("failed to read keyword file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Factory used by `start-dialogue` rules.
    pub fn with_factory(mut self, factory: Arc<dyn DialogueFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn config(&self) -> &KeywordConfig {
        &self.config
    }

    /// The first rule matching `body`, if any.
    pub fn matching_rule(&self, body: &str) -> Option<&KeywordRule> {
        self.config.rules.iter().find(|rule| rule.matches(body))
    }

    fn misconfigured(&self, rule: &KeywordRule, what: &str) -> ColloquyError {
        ColloquyError::MiddlewareFailed {
            middleware: self.name().to_string(),
            reason: format!("rule '{}' {}", rule.id, what),
        }
    }
}

#[async_trait]
impl Middleware for KeywordMiddleware {
    fn name(&self) -> &str {
        "keywords"
    }

    async fn before(&self, input: &UserInput, coordinator: &mut Coordinator) -> ColloquyResult<bool> {
        let Some(body) = input.body.as_deref() else {
            return Ok(true);
        };
        let Some(rule) = self.matching_rule(body) else {
            return Ok(true);
        };

        debug!(rule_id = %rule.id, action = ?rule.action, "keyword rule matched");

        match rule.action {
            RuleAction::Allow => Ok(true),

            RuleAction::Block => {
                info!(rule_id = %rule.id, "user message blocked by keyword rule");
                Ok(false)
            }

            RuleAction::Reply => {
                let reply = rule
                    .reply
                    .clone()
                    .ok_or_else(|| self.misconfigured(rule, "has action 'reply' but no reply text"))?;
                coordinator.interject_messages([reply]);
                Ok(false)
            }

            RuleAction::StartDialogue => {
                let identifier = rule
                    .dialogue
                    .as_deref()
                    .ok_or_else(|| self.misconfigured(rule, "has action 'start-dialogue' but no dialogue"))?;
                let factory = self
                    .factory
                    .as_ref()
                    .ok_or_else(|| self.misconfigured(rule, "starts a dialogue but no factory is configured"))?;
                let dialogue = factory.create(identifier)?;

                info!(rule_id = %rule.id, dialogue = identifier, clear_stack = rule.clear_stack, "starting dialogue from keyword");
                coordinator.start_dialogue(dialogue, rule.clear_stack).await;
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::Value;

    use colloquy_contracts::{
        config::CoordinatorConfig,
        error::StepError,
        input::DialogueInput,
        message::{Message, SYSTEM_DIALOGUE_IDENTIFIER},
    };
    use colloquy_core::{CoordinatorEvent, Dialogue, DialogueOutput};
    use colloquy_script::{HandlerDialogue, HandlerReply, InputHandler};

    // ── Helpers ──────────────────────────────────────────────────────────────

    /// Says its name on start and echoes every input.
    struct Echo(&'static str);

    #[async_trait]
    impl InputHandler for Echo {
        async fn greet(&self) -> Result<HandlerReply, StepError> {
            Ok(HandlerReply::reply(DialogueOutput::new().message(self.0)))
        }

        async fn handle(&self, input: DialogueInput) -> Result<HandlerReply, StepError> {
            let text = input.as_ref().and_then(Value::as_str).unwrap_or_default().to_string();
            Ok(HandlerReply::reply(DialogueOutput::new().message(format!("echo {text}"))))
        }
    }

    struct EchoFactory;

    impl DialogueFactory for EchoFactory {
        fn create(&self, identifier: &str) -> ColloquyResult<Box<dyn Dialogue>> {
            match identifier {
                "help" => Ok(Box::new(HandlerDialogue::new("help", Echo("How can I help?")))),
                other => Err(ColloquyError::UnknownDialogue {
                    identifier: other.to_string(),
                }),
            }
        }
    }

    const RULES: &str = r#"
        [[rules]]
        id = "pass-helpful"
        keywords = ["helpful"]
        matching = "contains"
        action = "allow"

        [[rules]]
        id = "help"
        description = "Open help"
        keywords = ["help"]
        matching = "contains"
        action = "start-dialogue"
        dialogue = "help"

        [[rules]]
        id = "swear"
        keywords = ["darn"]
        matching = "contains"
        action = "block"

        [[rules]]
        id = "hello"
        keywords = ["hi", "hello"]
        action = "reply"
        reply = "Hello there!"

        [[rules]]
        id = "reset"
        keywords = ["/reset"]
        action = "start-dialogue"
        dialogue = "help"
        clear_stack = true
    "#;

    async fn coordinator_with(middleware: KeywordMiddleware) -> Coordinator {
        let root: Box<dyn Dialogue> = Box::new(HandlerDialogue::new("root", Echo("Welcome")));
        let mut coordinator = Coordinator::with_root(CoordinatorConfig::default(), root);
        coordinator.add_middleware(Arc::new(middleware));
        coordinator.start().await.unwrap();
        coordinator
    }

    fn bodies(coordinator: &Coordinator) -> Vec<String> {
        coordinator
            .message_log()
            .iter()
            .filter_map(|m| m.body().map(str::to_string))
            .collect()
    }

    fn engine() -> KeywordMiddleware {
        KeywordMiddleware::from_toml_str(RULES)
            .unwrap()
            .with_factory(Arc::new(EchoFactory))
    }

    // ── Loading ──────────────────────────────────────────────────────────────

    #[test]
    fn malformed_toml_is_config_error() {
        let result = KeywordMiddleware::from_toml_str("rules = 3");
        assert!(matches!(result, Err(ColloquyError::ConfigError { .. })));
    }

    #[test]
    fn missing_file_is_config_error() {
        let result = KeywordMiddleware::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ColloquyError::ConfigError { .. })));
    }

    #[test]
    fn first_match_wins() {
        let engine = engine();
        assert_eq!(engine.matching_rule("this is helpful, not help").unwrap().id, "pass-helpful");
        assert_eq!(engine.matching_rule("help me").unwrap().id, "help");
        assert!(engine.matching_rule("ok").is_none());
    }

    // ── Before hook ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn unmatched_and_allowed_messages_pass() {
        let mut coordinator = coordinator_with(engine()).await;
        coordinator.send_user_message(UserInput::text("ok")).await;
        coordinator.send_user_message(UserInput::text("very helpful")).await;

        assert_eq!(
            bodies(&coordinator),
            vec!["Welcome", "ok", "echo ok", "very helpful", "echo very helpful"]
        );
    }

    #[tokio::test]
    async fn block_drops_message_silently() {
        let mut coordinator = coordinator_with(engine()).await;
        coordinator.send_user_message(UserInput::text("oh darn")).await;
        assert_eq!(bodies(&coordinator), vec!["Welcome"]);
    }

    #[tokio::test]
    async fn reply_interjects_system_message() {
        let mut coordinator = coordinator_with(engine()).await;
        coordinator.send_user_message(UserInput::text("Hello")).await;

        assert_eq!(bodies(&coordinator), vec!["Welcome", "Hello there!"]);
        let last = coordinator.message_log().last().and_then(Message::as_agent).unwrap();
        assert_eq!(last.meta.dialogue, SYSTEM_DIALOGUE_IDENTIFIER);
    }

    #[tokio::test]
    async fn start_dialogue_pushes_over_active() {
        let mut coordinator = coordinator_with(engine()).await;
        coordinator.send_user_message(UserInput::text("I need help")).await;

        assert_eq!(coordinator.stack(), vec!["root", "help"]);
        assert_eq!(bodies(&coordinator), vec!["Welcome", "How can I help?"]);
    }

    #[tokio::test]
    async fn start_dialogue_can_clear_stack() {
        let mut coordinator = coordinator_with(engine()).await;
        coordinator.send_user_message(UserInput::text("/reset")).await;
        assert_eq!(coordinator.stack(), vec!["help"]);
    }

    #[tokio::test]
    async fn value_only_input_passes() {
        let mut coordinator = coordinator_with(engine()).await;
        coordinator.send_user_message(UserInput::value(serde_json::json!("help"))).await;
        assert_eq!(coordinator.stack(), vec!["root"]);
    }

    #[tokio::test]
    async fn misconfigured_rules_report_middleware_failure() {
        let toml = r#"
            [[rules]]
            id = "broken"
            keywords = ["help"]
            action = "start-dialogue"
            dialogue = "help"
        "#;
        let mut coordinator = coordinator_with(KeywordMiddleware::from_toml_str(toml).unwrap()).await;
        let mut events = coordinator.subscribe();
        coordinator.send_user_message(UserInput::text("help")).await;

        let mut failed = false;
        while let Ok(event) = events.try_recv() {
            if let CoordinatorEvent::DialogueError(ColloquyError::MiddlewareFailed { middleware, reason }) = event {
                assert_eq!(middleware, "keywords");
                assert!(reason.contains("broken"));
                failed = true;
            }
        }
        assert!(failed);
        assert_eq!(bodies(&coordinator), vec!["Welcome"]);
    }
}
