// ABOUTME: Push-channel message types for hyperslide viewers
// ABOUTME: One serde tagged enum covering reload, style, sync, control and vote frames

use crate::errors::Result;
use serde::{Deserialize, Serialize};

/// Remote control commands relayed to every viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Next,
    Prev,
    Goto,
}

/// A message sent down the push channel. Serialized with a `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PushMessage {
    /// Content, layout or template change: reload the deck.
    Reload,
    /// Only stylesheets changed.
    StyleReload,
    /// The presenter moved to `index`.
    Sync { index: usize },
    Control {
        action: ControlAction,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        index: Option<usize>,
    },
    Vote {
        poll: String,
        option: usize,
        counts: Vec<u64>,
    },
}

impl PushMessage {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The event-stream frame carrying this message.
    pub fn frame(&self) -> Result<String> {
        Ok(format!("data: {}\n\n", self.to_json()?))
    }
}
