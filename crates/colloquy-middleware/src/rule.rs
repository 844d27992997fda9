//! Keyword rule types and configuration schema.
//!
//! A `KeywordConfig` is deserialized from TOML and holds an ordered list of
//! `KeywordRule`s. Rules are evaluated in declaration order and the first
//! matching rule wins. If no rule matches, the message passes through.

use serde::{Deserialize, Serialize};

/// How a rule's keywords are compared with the message body.
///
/// ```toml
/// matching = "exact"
/// matching = "contains"
/// matching = "prefix"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    #[default]
    Exact,
    Contains,
    Prefix,
}

/// What happens to a message that matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleAction {
    /// Pass the message on without consulting later rules.
    Allow,
    /// Drop the message silently.
    Block,
    /// Interject `reply` and drop the message.
    Reply,
    /// Start `dialogue` through the factory and drop the message.
    StartDialogue,
}

/// A single keyword rule loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Stable identifier used in logs and error messages.
    pub id: String,

    #[serde(default)]
    pub description: String,

    /// Any of these triggers the rule.
    pub keywords: Vec<String>,

    #[serde(default)]
    pub matching: MatchMode,

    #[serde(default)]
    pub case_sensitive: bool,

    pub action: RuleAction,

    /// Required when `action = "reply"`.
    pub reply: Option<String>,

    /// Required when `action = "start-dialogue"`. Identifier passed to the
    /// dialogue factory.
    pub dialogue: Option<String>,

    /// With `start-dialogue`: remove every dialogue before pushing.
    #[serde(default)]
    pub clear_stack: bool,
}

impl KeywordRule {
    /// Return true if any keyword matches `body`.
    ///
    /// The body is trimmed first. Comparison ignores case unless
    /// `case_sensitive` is set.
    pub fn matches(&self, body: &str) -> bool {
        let fold = |s: &str| {
            if self.case_sensitive {
                s.to_string()
            } else {
                s.to_lowercase()
            }
        };
        let body = fold(body.trim());
        self.keywords.iter().map(|k| fold(k.trim())).any(|keyword| match self.matching {
            MatchMode::Exact => body == keyword,
            MatchMode::Contains => body.contains(&keyword),
            MatchMode::Prefix => body.starts_with(&keyword),
        })
    }
}

/// The top-level structure deserialized from a keyword TOML file.
///
/// ```toml
/// [[rules]]
/// id = "help"
/// description = "Open the help dialogue"
/// keywords = ["help", "stuck"]
/// matching = "contains"
/// action = "start-dialogue"
/// dialogue = "help"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// Ordered list of rules. First match wins.
    #[serde(default)]
    pub rules: Vec<KeywordRule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(matching: MatchMode, case_sensitive: bool, keywords: &[&str]) -> KeywordRule {
        KeywordRule {
            id: "r".to_string(),
            description: String::new(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            matching,
            case_sensitive,
            action: RuleAction::Block,
            reply: None,
            dialogue: None,
            clear_stack: false,
        }
    }

    #[test]
    fn exact_ignores_case_and_surrounding_space() {
        let r = rule(MatchMode::Exact, false, &["help"]);
        assert!(r.matches("  HELP "));
        assert!(!r.matches("help me"));
    }

    #[test]
    fn case_sensitive_rules() {
        let r = rule(MatchMode::Exact, true, &["STOP"]);
        assert!(r.matches("STOP"));
        assert!(!r.matches("stop"));
    }

    #[test]
    fn contains_and_prefix() {
        let contains = rule(MatchMode::Contains, false, &["stuck"]);
        assert!(contains.matches("I am Stuck here"));

        let prefix = rule(MatchMode::Prefix, false, &["/"]);
        assert!(prefix.matches("/reset"));
        assert!(!prefix.matches("a/b"));
    }

    #[test]
    fn toml_defaults() {
        let config: KeywordConfig = toml::from_str(
            r#"
            [[rules]]
            id = "hello"
            keywords = ["hi"]
            action = "reply"
            reply = "Hello!"
            "#,
        )
        .unwrap();
        let r = &config.rules[0];
        assert_eq!(r.matching, MatchMode::Exact);
        assert!(!r.case_sensitive);
        assert!(!r.clear_stack);
        assert_eq!(r.action, RuleAction::Reply);
    }
}
