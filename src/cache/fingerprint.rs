//! Request fingerprinting.
//!
//! The fingerprint is a Sha256 digest over the semantically relevant request
//! fields in a fixed order. Only defined, non-`false` sampling fields
//! contribute, so an omitted option and a disabled one collapse to the same
//! key. The field order and framing are a compatibility surface: changing
//! them invalidates every previously persisted transcript.

use crate::pipeline::GenerationRequest;
use crate::types::message::{Content, Role};
use crate::Result;
use sha2::{Digest, Sha256};

const SEP: &[u8] = b"\x1f";
const END: &[u8] = b"\n";

/// Digest the request fields that affect generation semantics.
pub fn fingerprint(request: &GenerationRequest) -> Result<String> {
    let mut hasher = Sha256::new();

    for message in &request.messages {
        hasher.update(b"message");
        hasher.update(SEP);
        hasher.update(role_tag(message.role));
        hasher.update(SEP);
        match &message.content {
            Content::Text(text) => {
                hasher.update(b"text");
                hasher.update(SEP);
                hasher.update(text.as_bytes());
            }
            Content::Image { mime_type, data } => {
                hasher.update(b"image");
                hasher.update(SEP);
                hasher.update(mime_type.as_bytes());
                hasher.update(SEP);
                hasher.update(data);
            }
            Content::ToolCall { name, args, result } => {
                hasher.update(b"toolCall");
                hasher.update(SEP);
                hasher.update(name.as_bytes());
                hasher.update(SEP);
                hasher.update(serde_json::to_vec(args)?);
                hasher.update(SEP);
                hasher.update(serde_json::to_vec(result)?);
            }
        }
        hasher.update(END);
    }

    let sampling = &request.sampling;
    hasher.update(format!("maxOutputTokens={}", sampling.max_output_tokens));
    hasher.update(END);
    hasher.update(format!("temperature={}", sampling.temperature));
    hasher.update(END);
    hasher.update(format!("topP={}", sampling.top_p));
    hasher.update(END);
    if sampling.force_schema_constrained_tokens {
        hasher.update(b"forceSchemaConstrainedTokens=true");
        hasher.update(END);
    }

    for tool in &request.tools {
        hasher.update(b"tool");
        hasher.update(SEP);
        hasher.update(tool.name.as_bytes());
        hasher.update(SEP);
        hasher.update(tool.description.as_bytes());
        hasher.update(SEP);
        // serde_json orders map keys, so the encoded schema text is stable.
        hasher.update(serde_json::to_vec(&tool.parameters.to_wire())?);
        hasher.update(END);
    }

    if let Some(ref name) = request.force_tool {
        hasher.update(b"forceTool");
        hasher.update(SEP);
        hasher.update(name.as_bytes());
        hasher.update(END);
    }

    let digest: String = hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();
    Ok(digest)
}

fn role_tag(role: Role) -> &'static [u8] {
    match role {
        Role::User => b"user",
        Role::Model => b"model",
        Role::System => b"system",
    }
}
