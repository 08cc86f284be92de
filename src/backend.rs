//! The adapter boundary implemented once per provider backend.
//!
//! The core depends on exactly five operations; no backend-specific type
//! leaks past them. Wire shapes are associated types, so each backend names
//! its own raw message, schema, tool, and event payloads without the core
//! ever seeing provider details.

use crate::sampling::ResolvedSampling;
use crate::schema::Schema;
use crate::types::message::Message;
use crate::types::tool::ToolDescriptor;
use crate::{EventStream, Result};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// The raw event sequence a backend produces before translation.
pub type RawEventStream<E> = Pin<Box<dyn Stream<Item = Result<E>> + Send + 'static>>;

/// Which shape of output the caller asked for. Drives the mode-specific
/// event translation and the final-event payload.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputMode {
    /// Free text; the final event carries no structured payload.
    NaturalLanguage,
    /// Schema-constrained generation through a forced tool call; the final
    /// text must validate against the schema.
    StructuredData(Schema),
    /// The backend may choose between free text and one of the offered
    /// tools.
    OptionalTools,
}

/// A fully assembled request in the backend's own wire shapes.
pub struct RawRequest<'a, B: Backend + ?Sized> {
    pub messages: Vec<B::RawMessage>,
    pub sampling: &'a ResolvedSampling,
    pub tools: Vec<B::RawTool>,
    pub force_tool: Option<&'a str>,
}

/// One provider backend.
///
/// Implementations translate the core's messages, schemas, and tools into
/// their wire dialect, produce the raw event sequence for a request, and
/// translate raw events back into [`StreamEvent`](crate::StreamEvent)s for
/// the mode in play.
#[async_trait]
pub trait Backend: Send + Sync {
    type RawMessage: Send + Sync;
    type RawSchema: Send + Sync;
    type RawTool: Send + Sync;
    type RawEvent: Send + 'static;

    fn to_raw_messages(&self, messages: &[Message]) -> Result<Vec<Self::RawMessage>>;

    fn to_raw_schema(&self, schema: &Schema) -> Result<Self::RawSchema>;

    fn to_raw_tool(&self, tool: &ToolDescriptor) -> Result<Self::RawTool>;

    /// Start generation and return the ordered raw event sequence.
    async fn generate_raw_events(
        &self,
        request: RawRequest<'_, Self>,
    ) -> Result<RawEventStream<Self::RawEvent>>;

    /// Translate raw events into the public event shape for `mode`.
    fn from_raw_events(
        &self,
        mode: &OutputMode,
        raw: RawEventStream<Self::RawEvent>,
    ) -> EventStream;
}
