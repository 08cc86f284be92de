//! Streaming events produced by one generation call.

use serde::{Deserialize, Serialize};

/// One event in a generation stream.
///
/// A well-formed stream is zero or more `Chunk`s followed by exactly one
/// `Final`. The `Final` carries the whole concatenated text plus, depending
/// on the generation mode, a structured payload:
///
/// - free text: `data` is `None`
/// - schema-forced generation: `data` is the validated value
/// - optional tools: `data` is a `{name, args}` object when the backend chose
///   a tool, `None` when it answered in free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum StreamEvent {
    #[serde(rename = "chunk")]
    Chunk { text: String },
    #[serde(rename = "final", rename_all = "camelCase")]
    Final {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
        /// Further simultaneous tool calls, when the backend issued several
        /// at once. Backend-dependent; absent on most providers.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        additional_data: Option<Vec<serde_json::Value>>,
    },
}

impl StreamEvent {
    pub fn chunk(text: impl Into<String>) -> Self {
        StreamEvent::Chunk { text: text.into() }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        StreamEvent::Final {
            text: text.into(),
            data: None,
            additional_data: None,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, StreamEvent::Final { .. })
    }

    /// Borrow this event as a [`FinalEvent`] view, if it is terminal.
    pub fn as_final(&self) -> Option<FinalEvent<'_>> {
        match self {
            StreamEvent::Final {
                text,
                data,
                additional_data,
            } => Some(FinalEvent {
                text,
                data: data.as_ref(),
                additional_data: additional_data.as_deref(),
            }),
            StreamEvent::Chunk { .. } => None,
        }
    }
}

/// Borrowed view of a terminal event, as returned by
/// [`ReplayStream::result`](crate::ReplayStream::result) consumers.
#[derive(Debug, Clone, Copy)]
pub struct FinalEvent<'a> {
    pub text: &'a str,
    pub data: Option<&'a serde_json::Value>,
    pub additional_data: Option<&'a [serde_json::Value]>,
}
