//! Request assembly: message ordering, sampling resolution, and tool
//! descriptor synthesis for the three generation modes.
//!
//! The pipeline guarantees the step order the call surface promises:
//! messages are assembled first (optional system prompt, required user
//! prompt, caller-supplied extras verbatim), sampling options are resolved
//! and validated second, tool descriptors third. No reordering happens
//! between assembly and the eventual raw-event call.

mod source;

pub use source::{DirectSource, EventSource};

use crate::backend::OutputMode;
use crate::sampling::{self, ResolvedSampling, SamplingOptions};
use crate::schema::Schema;
use crate::types::message::Message;
use crate::types::tool::{ToolDescriptor, ToolSpec};
use crate::Result;
use std::collections::BTreeMap;
use tracing::debug;

/// Name of the tool synthesized for schema-constrained generation.
pub const STRUCTURED_TOOL_NAME: &str = "structured_data";

/// The caller's chosen call shape, before assembly.
#[derive(Debug, Clone)]
pub enum RequestShape {
    NaturalLanguage,
    StructuredData(Schema),
    OptionalTools(BTreeMap<String, ToolSpec>),
}

/// A fully assembled, resolved generation request.
///
/// This is the unit the event-source seam (and therefore the cache) works
/// with: everything semantically relevant to one generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub messages: Vec<Message>,
    pub sampling: ResolvedSampling,
    pub tools: Vec<ToolDescriptor>,
    pub force_tool: Option<String>,
    pub mode: OutputMode,
}

/// Assemble and validate a request.
pub fn assemble(
    prompt: &str,
    system_prompt: Option<&str>,
    extra_messages: &[Message],
    instance_sampling: Option<&SamplingOptions>,
    call_sampling: Option<&SamplingOptions>,
    shape: RequestShape,
) -> Result<GenerationRequest> {
    if prompt.is_empty() {
        return Err(crate::Error::InvalidInput(
            "prompt must not be empty".into(),
        ));
    }

    // Step 1: ordered messages — system, user, then extras verbatim.
    let mut messages = Vec::with_capacity(2 + extra_messages.len());
    if let Some(system) = system_prompt {
        messages.push(Message::system(system));
    }
    messages.push(Message::user(prompt));
    messages.extend_from_slice(extra_messages);

    // Step 2: three-layer sampling resolution, hard validation first.
    let sampling = sampling::resolve(instance_sampling, call_sampling)?;

    // Step 3: tool synthesis per mode.
    let (tools, force_tool, mode) = match shape {
        RequestShape::NaturalLanguage => (Vec::new(), None, OutputMode::NaturalLanguage),
        RequestShape::StructuredData(schema) => {
            let tool = ToolDescriptor::new(
                STRUCTURED_TOOL_NAME,
                "Produce the structured output described by the parameters schema.",
                schema.clone(),
            );
            (
                vec![tool],
                Some(STRUCTURED_TOOL_NAME.to_string()),
                OutputMode::StructuredData(schema),
            )
        }
        RequestShape::OptionalTools(map) => {
            let tools = map
                .into_iter()
                .map(|(name, spec)| ToolDescriptor::new(name, spec.description, spec.parameters))
                .collect();
            (tools, None, OutputMode::OptionalTools)
        }
    };

    debug!(
        messages = messages.len(),
        tools = tools.len(),
        force_tool = force_tool.as_deref().unwrap_or("-"),
        "assembled generation request"
    );

    Ok(GenerationRequest {
        messages,
        sampling,
        tools,
        force_tool,
        mode,
    })
}
