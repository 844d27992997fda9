//! Input validation schema and report types.
//!
//! Steps that need more than a one-line check describe acceptable input as an
//! `InputSchema`: an optional JSON Schema document plus ordered rules. The
//! validator reports every failure; a failing report becomes an invalid-input
//! reprompt carrying `reprompt`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Description of what a step accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSchema {
    /// Identifier used in logs (e.g. "age-v1").
    pub schema_id: String,
    /// JSON Schema applied to the input value. `Value::Null` disables it.
    #[serde(default)]
    pub json_schema: Value,
    /// Rules evaluated after structural validation.
    #[serde(default)]
    pub rules: Vec<InputRule>,
    /// Message shown to the user when validation fails.
    pub reprompt: String,
}

/// A single rule applied to an input value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputRule {
    pub rule_id: String,
    pub description: String,
    pub rule_type: InputRuleType,
}

/// Checks supported out of the box. String rules ignore non-string inputs;
/// `Range` accepts JSON numbers and numeric strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InputRuleType {
    MinLength { min: usize },
    MaxLength { max: usize },
    Range { min: f64, max: f64 },
    OneOf { allowed: Vec<Value> },
    /// The input string must not contain `pattern` as a substring.
    ForbiddenPattern { pattern: String },
    /// Delegate to a function registered with the validator.
    Custom { function_name: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True only if every check passed.
    pub passed: bool,
    pub failures: Vec<ValidationFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub rule_id: String,
    pub message: String,
}
