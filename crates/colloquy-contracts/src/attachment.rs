//! Attachments carried by agent and user messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Non-text content attached to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Attachment {
    Image {
        href: String,
    },
    #[serde(rename_all = "camelCase")]
    Custom {
        custom_type: String,
        #[serde(default)]
        data: Value,
    },
}

impl Attachment {
    pub fn image(href: impl Into<String>) -> Self {
        Self::Image { href: href.into() }
    }
}
