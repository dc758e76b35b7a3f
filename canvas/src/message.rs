//! Draw payloads exchanged between peers.
//!
//! These are the JSON bodies handed to the messaging layer. The drawing
//! channel is shared with the rest of the game (chat, guesses, turn changes),
//! so [`DrawMessage::from_value`] separates "not ours" from "ours but broken"
//! and the session only logs the latter as a problem.

#[cfg(test)]
#[path = "message_test.rs"]
mod message_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::VectorPath;
use crate::preview::PreviewPath;

const TYPE_PREVIEW: &str = "preview";
const TYPE_DRAW: &str = "draw";
const TYPE_REPLACE: &str = "draw_replace_state";

/// One draw-protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawMessage {
    /// In-progress snapshot of the sender's current gesture.
    Preview {
        path: PreviewPath,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gesture: Option<u64>,
    },
    /// One committed stroke.
    Draw {
        points: VectorPath,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gesture: Option<u64>,
    },
    /// The sender's full log, replacing the receiver's.
    DrawReplaceState { points: Vec<VectorPath> },
}

/// Why an inbound payload was not turned into a [`DrawMessage`].
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("payload has no string `type` field")]
    MissingType,
    /// A message for another part of the game; not an error for this layer.
    #[error("not a draw message: {0}")]
    Unhandled(String),
    #[error("malformed {kind} payload: {source}")]
    Malformed {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl MessageError {
    /// Whether the payload was a draw message that failed validation.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Unhandled(_))
    }
}

impl DrawMessage {
    /// Parse an inbound payload.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Unhandled`] for payloads whose `type` belongs
    /// to another protocol, and a structural error for anything else that
    /// does not match the draw message shapes.
    pub fn from_value(value: &Value) -> Result<Self, MessageError> {
        let Some(obj) = value.as_object() else {
            return Err(MessageError::NotAnObject);
        };
        let Some(raw_type) = obj.get("type").and_then(Value::as_str) else {
            return Err(MessageError::MissingType);
        };
        let kind = match raw_type {
            TYPE_PREVIEW => TYPE_PREVIEW,
            TYPE_DRAW => TYPE_DRAW,
            TYPE_REPLACE => TYPE_REPLACE,
            other => return Err(MessageError::Unhandled(other.to_owned())),
        };
        serde_json::from_value(value.clone()).map_err(|source| MessageError::Malformed { kind, source })
    }

    /// Serialize for the messaging layer.
    #[must_use]
    pub fn to_value(&self) -> Value {
        // Only string keys and plain numbers here; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// The wire `type` of this message.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Preview { .. } => TYPE_PREVIEW,
            Self::Draw { .. } => TYPE_DRAW,
            Self::DrawReplaceState { .. } => TYPE_REPLACE,
        }
    }
}
