//! Input modes: how the user is expected to answer a prompt.
//!
//! An input mode travels with the last agent message of a turn. Presentation
//! layers read it to decide which control to render; the coordinator reads
//! only the `is_undoable` flag.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The value handed to a dialogue when it receives user input.
///
/// `None` means "no input" (a chained step, or a resume without a value).
pub type DialogueInput = Option<Value>;

/// Keyboard hint for free-text prompts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Keyboard {
    #[default]
    Default,
    Numeric,
    Email,
}

/// One selectable option in a picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Label shown to the user.
    pub body: String,
    /// Value dispatched to the dialogue when this choice is picked.
    pub value: Value,
}

impl Choice {
    pub fn new(body: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            body: body.into(),
            value: value.into(),
        }
    }
}

/// The shape of an input mode, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputKind {
    Text {
        #[serde(default)]
        keyboard: Keyboard,
    },
    Slider {
        min: f64,
        max: f64,
    },
    Picker {
        choices: Vec<Choice>,
    },
    #[serde(rename_all = "camelCase")]
    Custom {
        custom_type: String,
    },
}

/// A prompt's input mode plus its undo flag.
///
/// `is_undoable` defaults to `true` when absent from serialized data: only an
/// explicit `false` makes a prompt non-undoable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputMode {
    #[serde(flatten)]
    pub kind: InputKind,
    #[serde(default = "default_undoable")]
    pub is_undoable: bool,
}

fn default_undoable() -> bool {
    true
}

impl InputMode {
    pub fn new(kind: InputKind) -> Self {
        Self {
            kind,
            is_undoable: true,
        }
    }

    pub fn text() -> Self {
        Self::new(InputKind::Text {
            keyboard: Keyboard::Default,
        })
    }

    pub fn text_with_keyboard(keyboard: Keyboard) -> Self {
        Self::new(InputKind::Text { keyboard })
    }

    pub fn slider(min: f64, max: f64) -> Self {
        Self::new(InputKind::Slider { min, max })
    }

    pub fn picker(choices: impl IntoIterator<Item = Choice>) -> Self {
        Self::new(InputKind::Picker {
            choices: choices.into_iter().collect(),
        })
    }

    pub fn custom(custom_type: impl Into<String>) -> Self {
        Self::new(InputKind::Custom {
            custom_type: custom_type.into(),
        })
    }

    /// Mark this prompt as one the user cannot take back.
    pub fn not_undoable(mut self) -> Self {
        self.is_undoable = false;
        self
    }

    /// Short name of the mode kind, for logs.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            InputKind::Text { .. } => "text",
            InputKind::Slider { .. } => "slider",
            InputKind::Picker { .. } => "picker",
            InputKind::Custom { .. } => "custom",
        }
    }

    /// The picker's choices, or an empty slice for other kinds.
    pub fn choices(&self) -> &[Choice] {
        match &self.kind {
            InputKind::Picker { choices } => choices,
            _ => &[],
        }
    }
}
