//! Unified message format.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// One conversation turn handed to the generation pipeline.
///
/// Immutable once built; consumed once per generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Content,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Content::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Content::Text(text.into()),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: Content::Text(text.into()),
        }
    }

    pub fn with_content(role: Role, content: Content) -> Self {
        Self { role, content }
    }

    /// Build a user message carrying an image read from disk, guessing the
    /// mime type from the file extension.
    pub fn user_image_from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let mime_type = guess_mime_type(path).ok_or_else(|| {
            crate::Error::InvalidInput(format!(
                "cannot determine image mime type for {}",
                path.display()
            ))
        })?;
        Ok(Self {
            role: Role::User,
            content: Content::Image { mime_type, data },
        })
    }

    pub fn contains_image(&self) -> bool {
        matches!(self.content, Content::Image { .. })
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    System,
}

/// Message content. A single exclusive variant per message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Content {
    #[serde(rename = "text")]
    Text(#[serde(with = "text_field")] String),
    /// An inline binary image payload.
    #[serde(rename = "image", rename_all = "camelCase")]
    Image {
        mime_type: String,
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },
    /// A completed tool invocation echoed back into the conversation.
    #[serde(rename = "toolCall")]
    ToolCall {
        name: String,
        args: serde_json::Value,
        result: serde_json::Value,
    },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text(text.into())
    }
}

/// Serialize the text payload as a `{ "text": ... }` map so the internally
/// tagged representation of [`Content`] can carry it alongside the tag.
mod text_field {
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(text: &str, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("text", text)?;
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        #[derive(Deserialize)]
        struct TextField {
            text: String,
        }
        Ok(TextField::deserialize(deserializer)?.text)
    }
}

/// Serialize binary payloads as base64 so persisted transcripts stay
/// human-diffable text.
mod base64_bytes {
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(s)
            .map_err(serde::de::Error::custom)
    }
}

fn guess_mime_type(path: &Path) -> Option<String> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    let mt = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => return None,
    };
    Some(mt.to_string())
}
