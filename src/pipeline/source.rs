//! The event-source seam between the pipeline and the adapter boundary.
//!
//! [`DirectSource`] performs the five boundary calls against a concrete
//! [`Backend`]. The cache decorates this seam: anything that can `open` a
//! request into an event stream can stand in for real generation.

use super::GenerationRequest;
use crate::backend::{Backend, OutputMode, RawRequest};
use crate::schema;
use crate::types::events::StreamEvent;
use crate::{EventStream, Result};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

/// Anything that can turn an assembled request into a generation event
/// stream.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn open(&self, request: &GenerationRequest) -> Result<EventStream>;
}

/// The real thing: drives a [`Backend`] through the adapter boundary.
pub struct DirectSource<B> {
    backend: B,
}

impl<B: Backend> DirectSource<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: Backend> EventSource for DirectSource<B> {
    async fn open(&self, request: &GenerationRequest) -> Result<EventStream> {
        let messages = self.backend.to_raw_messages(&request.messages)?;
        let tools = request
            .tools
            .iter()
            .map(|t| self.backend.to_raw_tool(t))
            .collect::<Result<Vec<_>>>()?;

        debug!(tools = tools.len(), "opening backend generation");
        let raw = self
            .backend
            .generate_raw_events(RawRequest {
                messages,
                sampling: &request.sampling,
                tools,
                force_tool: request.force_tool.as_deref(),
            })
            .await?;

        let events = self.backend.from_raw_events(&request.mode, raw);

        Ok(match &request.mode {
            OutputMode::StructuredData(target) => validate_final(events, target.clone()),
            OutputMode::NaturalLanguage | OutputMode::OptionalTools => events,
        })
    }
}

/// Validate the terminal event's text against the forced schema and attach
/// the parsed value as its `data` payload.
fn validate_final(events: EventStream, target: crate::schema::Schema) -> EventStream {
    Box::pin(events.map(move |item| match item {
        Ok(StreamEvent::Final {
            text,
            additional_data,
            ..
        }) => {
            let data = schema::validate(&target, &text)?;
            Ok(StreamEvent::Final {
                text,
                data: Some(data),
                additional_data,
            })
        }
        other => other,
    }))
}
