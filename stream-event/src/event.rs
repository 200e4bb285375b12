//! Reply event types (type + payload).
//! Dataset lists are carried as `serde_json::Value`; databot serializes its records into that.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire shape for one reply pushed to the presentation layer.
/// The envelope (session_id, state, event_id) is applied separately.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplyEvent {
    /// Plain text message.
    Text { message: String },
    /// Array of dataset objects (`dataset_title`, `dataset_url`, ...).
    Datasets { datasets: Value },
    /// Quick-reply options.
    Options { options: Vec<String> },
}

impl ReplyEvent {
    /// Serializes this event to a JSON object (type + payload only; no envelope).
    ///
    /// Use crate-level [`crate::to_json`] when you need envelope fields injected.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
