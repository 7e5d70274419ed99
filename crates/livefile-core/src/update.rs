//! Messages flowing through the pipeline and over the wire.

use serde::{Deserialize, Serialize};

/// A watched file's content changed.
///
/// Produced by the watch normalizer and consumed once by the broadcaster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub logical_id: String,
}

impl ChangeEvent {
    pub fn new(logical_id: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
        }
    }
}

/// Full content of one file, pushed to every client.
///
/// Serialized as `{"File": "<logical id>", "Content": "<text>"}`. Clients
/// replace whatever they display for `File` with `Content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    #[serde(rename = "File")]
    pub file: String,
    #[serde(rename = "Content")]
    pub content: String,
}

impl Update {
    pub fn new(file: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            content: content.into(),
        }
    }

    /// Encode as a single JSON text frame.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Inbound request from the bundled client asking for a file's current content.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscribeRequest {
    #[serde(alias = "File")]
    pub file: String,
}

impl SubscribeRequest {
    /// Parse an inbound text frame, returning `None` for anything else.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}
