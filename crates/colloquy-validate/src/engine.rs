//! Schema-driven input validator.
//!
//! `InputValidator` checks a step's input in two phases:
//!
//! 1. **Structural**: the input value is validated against
//!    `InputSchema::json_schema` with the `jsonschema` crate. A missing input
//!    is validated as JSON `null`.
//! 2. **Rules**: each `InputRule` is evaluated in order. Every failure is
//!    collected so the report lists all of them.
//!
//! `check` folds a report into the `StepError` the step engine understands,
//! so a failing input becomes a reprompt with `InputSchema::reprompt`.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use colloquy_contracts::{
    error::StepError,
    input::DialogueInput,
    validation::{InputRuleType, InputSchema, ValidationFailure, ValidationReport},
};

use crate::validators::number_of;

/// A caller-supplied check. Returns `Some(message)` on failure.
pub type CustomRuleFn = Box<dyn Fn(&Value) -> Option<String> + Send + Sync>;

pub struct InputValidator {
    custom_rules: HashMap<String, CustomRuleFn>,
}

impl InputValidator {
    pub fn new() -> Self {
        Self {
            custom_rules: HashMap::new(),
        }
    }

    /// Register a custom rule under `name`, replacing any previous one.
    ///
    /// The name must match `function_name` in `InputRuleType::Custom`.
    pub fn register_rule(&mut self, name: impl Into<String>, f: CustomRuleFn) {
        self.custom_rules.insert(name.into(), f);
    }

    /// Run both phases and report every failure.
    pub fn validate(&self, input: &DialogueInput, schema: &InputSchema) -> ValidationReport {
        let null = Value::Null;
        let value = input.as_ref().unwrap_or(&null);
        let mut failures: Vec<ValidationFailure> = Vec::new();

        // ── Phase 1: JSON Schema ──────────────────────────────────────────────
        if !schema.json_schema.is_null() {
            match jsonschema::validator_for(&schema.json_schema) {
                Ok(validator) => {
                    for error in validator.iter_errors(value) {
                        let message = format!("JSON Schema violation at {}: {}", error.instance_path, error);
                        debug!(schema_id = %schema.schema_id, %message, "structural input failure");
                        failures.push(ValidationFailure {
                            rule_id: "json-schema".to_string(),
                            message,
                        });
                    }
                }
                Err(e) => {
                    let message = format!("invalid JSON Schema document: {e}");
                    warn!(schema_id = %schema.schema_id, %message, "schema compilation failure");
                    failures.push(ValidationFailure {
                        rule_id: "json-schema".to_string(),
                        message,
                    });
                }
            }
        }

        // ── Phase 2: rules ────────────────────────────────────────────────────
        for rule in &schema.rules {
            let failure = match &rule.rule_type {
                InputRuleType::MinLength { min } => value
                    .as_str()
                    .filter(|s| s.chars().count() < *min)
                    .map(|_| format!("input is shorter than {min} characters")),

                InputRuleType::MaxLength { max } => value
                    .as_str()
                    .filter(|s| s.chars().count() > *max)
                    .map(|_| format!("input is longer than {max} characters")),

                InputRuleType::Range { min, max } => match number_of(input) {
                    Some(n) if (*min..=*max).contains(&n) => None,
                    Some(n) => Some(format!("{n} is outside {min}..={max}")),
                    None => Some("input is not a number".to_string()),
                },

                InputRuleType::OneOf { allowed } => {
                    if allowed.contains(value) {
                        None
                    } else {
                        Some(format!("{value} is not an allowed answer"))
                    }
                }

                // Non-string inputs pass.
                InputRuleType::ForbiddenPattern { pattern } => value
                    .as_str()
                    .filter(|s| s.contains(pattern.as_str()))
                    .map(|_| format!("input contains forbidden pattern '{pattern}'")),

                InputRuleType::Custom { function_name } => match self.custom_rules.get(function_name.as_str()) {
                    Some(f) => f(value),
                    None => Some(format!("no custom rule registered for function name '{function_name}'")),
                },
            };

            if let Some(message) = failure {
                debug!(rule_id = %rule.rule_id, description = %rule.description, %message, "input rule failed");
                failures.push(ValidationFailure {
                    rule_id: rule.rule_id.clone(),
                    message,
                });
            }
        }

        let passed = failures.is_empty();
        debug!(
            schema_id = %schema.schema_id,
            passed,
            failure_count = failures.len(),
            "input validation complete"
        );
        ValidationReport { passed, failures }
    }

    /// Validate and return the input value, or an invalid-input error
    /// carrying `schema.reprompt`.
    pub fn check(&self, input: &DialogueInput, schema: &InputSchema) -> Result<Value, StepError> {
        let report = self.validate(input, schema);
        if report.passed {
            Ok(input.clone().unwrap_or(Value::Null))
        } else {
            Err(StepError::invalid_input(schema.reprompt.clone()))
        }
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use colloquy_contracts::{
        error::StepError,
        validation::{InputRule, InputRuleType, InputSchema},
    };

    use super::InputValidator;

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn make_schema(json_schema: Value, rules: Vec<InputRule>) -> InputSchema {
        InputSchema {
            schema_id: "test-input-v1".to_string(),
            json_schema,
            rules,
            reprompt: "Please try again.".to_string(),
        }
    }

    fn rule(id: &str, rule_type: InputRuleType) -> InputRule {
        InputRule {
            rule_id: id.to_string(),
            description: format!("{id} rule"),
            rule_type,
        }
    }

    // ── JSON Schema ──────────────────────────────────────────────────────────

    #[test]
    fn schema_pass_and_fail() {
        let validator = InputValidator::new();
        let schema = make_schema(json!({ "type": "string", "minLength": 1 }), vec![]);

        assert!(validator.validate(&Some(json!("Ada")), &schema).passed);

        let report = validator.validate(&Some(json!(42)), &schema);
        assert!(!report.passed);
        assert_eq!(report.failures[0].rule_id, "json-schema");
    }

    #[test]
    fn missing_input_is_validated_as_null() {
        let validator = InputValidator::new();
        let schema = make_schema(json!({ "type": "string" }), vec![]);
        assert!(!validator.validate(&None, &schema).passed);
    }

    #[test]
    fn malformed_schema_is_a_failure_not_a_panic() {
        let validator = InputValidator::new();
        let schema = make_schema(json!({ "type": 12 }), vec![]);
        let report = validator.validate(&Some(json!("x")), &schema);
        assert!(!report.passed);
        assert!(report.failures[0].message.contains("invalid JSON Schema"));
    }

    // ── Rules ────────────────────────────────────────────────────────────────

    #[test]
    fn length_rules_count_characters() {
        let validator = InputValidator::new();
        let schema = make_schema(
            Value::Null,
            vec![
                rule("min", InputRuleType::MinLength { min: 2 }),
                rule("max", InputRuleType::MaxLength { max: 4 }),
            ],
        );
        assert!(validator.validate(&Some(json!("Zoë")), &schema).passed);

        let report = validator.validate(&Some(json!("x")), &schema);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].rule_id, "min");

        let report = validator.validate(&Some(json!("Augusta")), &schema);
        assert_eq!(report.failures[0].rule_id, "max");
    }

    #[test]
    fn range_accepts_numeric_strings() {
        let validator = InputValidator::new();
        let schema = make_schema(Value::Null, vec![rule("age", InputRuleType::Range { min: 0.0, max: 120.0 })]);

        assert!(validator.validate(&Some(json!(36)), &schema).passed);
        assert!(validator.validate(&Some(json!("36")), &schema).passed);
        assert!(!validator.validate(&Some(json!(200)), &schema).passed);
        assert!(!validator.validate(&Some(json!("old")), &schema).passed);
    }

    #[test]
    fn one_of_and_forbidden_pattern() {
        let validator = InputValidator::new();
        let schema = make_schema(
            Value::Null,
            vec![
                rule("answer", InputRuleType::OneOf { allowed: vec![json!("yes"), json!("no")] }),
                rule("no-shouting", InputRuleType::ForbiddenPattern { pattern: "!!".to_string() }),
            ],
        );
        assert!(validator.validate(&Some(json!("yes")), &schema).passed);

        let report = validator.validate(&Some(json!("maybe!!")), &schema);
        let ids: Vec<&str> = report.failures.iter().map(|f| f.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["answer", "no-shouting"]);
    }

    #[test]
    fn custom_rules_and_unregistered_names() {
        let mut validator = InputValidator::new();
        validator.register_rule(
            "even",
            Box::new(|v| match v.as_i64() {
                Some(n) if n % 2 == 0 => None,
                _ => Some("expected an even number".to_string()),
            }),
        );

        let schema = make_schema(
            Value::Null,
            vec![rule("even", InputRuleType::Custom { function_name: "even".to_string() })],
        );
        assert!(validator.validate(&Some(json!(4)), &schema).passed);
        assert!(!validator.validate(&Some(json!(5)), &schema).passed);

        let missing = make_schema(
            Value::Null,
            vec![rule("ghost", InputRuleType::Custom { function_name: "ghost".to_string() })],
        );
        let report = validator.validate(&Some(json!(4)), &missing);
        assert!(report.failures[0].message.contains("ghost"));
    }

    // ── check ────────────────────────────────────────────────────────────────

    #[test]
    fn check_maps_failure_to_reprompt() {
        let validator = InputValidator::default();
        let schema = make_schema(Value::Null, vec![rule("min", InputRuleType::MinLength { min: 3 })]);

        assert_eq!(validator.check(&Some(json!("Ada")), &schema).unwrap(), json!("Ada"));
        assert_eq!(
            validator.check(&Some(json!("A")), &schema).unwrap_err(),
            StepError::invalid_input("Please try again.")
        );
    }
}
