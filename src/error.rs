//! Unified error type for the generation core.
//!
//! The taxonomy distinguishes caller mistakes (`SchemaCompile`,
//! `InvalidInput`), backend limitations (`Capability`, `ResultLimit`), bad
//! model output (`ResultValidate`), and adapter bugs (`ProtocolViolation`).
//! The type is `Clone` so that one terminal error can be delivered verbatim
//! to every consumer of a [`ReplayStream`](crate::ReplayStream); I/O and JSON
//! sources are held behind `Arc` for that reason.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Unified error type for the library
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A schema uses a construct outside the supported wire dialect.
    /// Raised at schema build/decode time, never during generation.
    #[error("unsupported schema construct `{keyword}` at `{path}`")]
    SchemaCompile { keyword: String, path: String },

    /// A message, option, or schema shape is malformed before any call is made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The selected backend/model does not support a requested feature.
    #[error("backend capability missing: {0}")]
    Capability(String),

    /// Output was truncated by `maxOutputTokens` before the schema or tool
    /// contract was satisfied.
    #[error("output truncated before completion: {0}")]
    ResultLimit(String),

    /// Generated text failed validation against the requested schema.
    #[error("generated output failed schema validation ({} issue(s))", issues.len())]
    ResultValidate {
        /// The raw text as produced by the backend.
        raw_text: String,
        /// Best-effort parsed value, if the text was at least valid JSON.
        parsed: Option<serde_json::Value>,
        /// Structured constraint violations.
        issues: Vec<Issue>,
    },

    /// The adapter boundary completed its event sequence without ever
    /// emitting a `Final` event. A bug in the adapter, not the caller.
    #[error("event stream ended without a final event")]
    ProtocolViolation,

    /// An error raised by the backend adapter, forwarded verbatim.
    #[error("backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("serialization error: {0}")]
    Serialization(Arc<serde_json::Error>),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(Arc::new(e))
    }
}

/// One constraint violation found while validating generated output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// JSON path to the violation (e.g. `"user.name"`, `"items[0]"`).
    pub path: String,
    /// What kind of constraint was violated.
    pub kind: IssueKind,
    /// Human-readable description.
    pub message: String,
}

impl Issue {
    pub fn new(path: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Categories of validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Value has the wrong JSON type.
    Type,
    /// Numeric value outside its allowed range.
    Range,
    /// String or array length outside its allowed bounds.
    Length,
    /// Value not a member of the declared enum set.
    Enum,
    /// Value differs from the declared constant.
    Const,
    /// A required object property is missing.
    Required,
    /// An object property is not allowed by a closed object.
    UnknownProperty,
    /// Tuple has the wrong number of elements.
    Arity,
    /// String does not match its pattern or named format.
    Format,
    /// Text was not parseable as a wire value at all.
    Parse,
}
