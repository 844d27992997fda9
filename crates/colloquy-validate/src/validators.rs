//! One-line input checks for step bodies.
//!
//! The `is_*` predicates only answer yes or no. The `require_*` helpers turn
//! an input into the typed value a step wants, or into an invalid-input
//! error carrying the message the user sees as a reprompt.

use serde_json::Value;

use colloquy_contracts::{error::StepError, input::DialogueInput};

/// Anything at all was given.
pub fn is_any(input: &DialogueInput) -> bool {
    !matches!(input, None | Some(Value::Null))
}

/// A string that parses as a number.
pub fn is_number(input: &DialogueInput) -> bool {
    input
        .as_ref()
        .and_then(Value::as_str)
        .is_some_and(|s| parse_number(s).is_some())
}

pub fn is_string(input: &DialogueInput) -> bool {
    matches!(input, Some(Value::String(_)))
}

pub fn is_non_empty_string(input: &DialogueInput) -> bool {
    matches!(input, Some(Value::String(s)) if !s.trim().is_empty())
}

/// Apply `check` to the input and hand the input back, or fail with `message`.
pub fn validated_input(
    input: DialogueInput,
    check: impl Fn(&DialogueInput) -> bool,
    message: &str,
) -> Result<Value, StepError> {
    if check(&input) {
        Ok(input.unwrap_or(Value::Null))
    } else {
        Err(StepError::invalid_input(message))
    }
}

pub fn require_text(input: &DialogueInput, message: &str) -> Result<String, StepError> {
    match input {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(StepError::invalid_input(message)),
    }
}

/// Trimmed, non-empty text.
pub fn require_non_empty_text(input: &DialogueInput, message: &str) -> Result<String, StepError> {
    match input {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(StepError::invalid_input(message)),
    }
}

/// A JSON number, or a string that parses as one.
pub fn require_number(input: &DialogueInput, message: &str) -> Result<f64, StepError> {
    number_of(input).ok_or_else(|| StepError::invalid_input(message))
}

/// A number within `min..=max`.
pub fn require_in_range(input: &DialogueInput, min: f64, max: f64, message: &str) -> Result<f64, StepError> {
    number_of(input)
        .filter(|n| (min..=max).contains(n))
        .ok_or_else(|| StepError::invalid_input(message))
}

/// A JSON boolean, or one of "yes"/"no"/"true"/"false".
pub fn require_bool(input: &DialogueInput, message: &str) -> Result<bool, StepError> {
    match input {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "y" => Ok(true),
            "no" | "false" | "n" => Ok(false),
            _ => Err(StepError::invalid_input(message)),
        },
        _ => Err(StepError::invalid_input(message)),
    }
}

pub(crate) fn number_of(input: &DialogueInput) -> Option<f64> {
    match input {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_number(s),
        _ => None,
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
