//! The public generation surface.
//!
//! [`GenClient`] owns an [`EventSource`] (a [`DirectSource`] over a backend,
//! or a [`CachedSource`](crate::cache::CachedSource) in front of one) and an
//! optional instance-level sampling overlay. Each generate call assembles a
//! request, opens the source, and hands back a [`ReplayStream`].

use crate::pipeline::{self, EventSource, RequestShape};
use crate::sampling::SamplingOptions;
use crate::schema::Schema;
use crate::stream::ReplayStream;
use crate::types::message::Message;
use crate::types::tool::ToolSpec;
use crate::Result;
use std::collections::BTreeMap;
use tracing::debug;

/// Per-call parameters shared by all three generation modes.
#[derive(Debug, Clone, Default)]
pub struct GenerateParams {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub extra_messages: Vec<Message>,
    pub sampling: Option<SamplingOptions>,
}

impl GenerateParams {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_extra_messages(mut self, messages: Vec<Message>) -> Self {
        self.extra_messages = messages;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingOptions) -> Self {
        self.sampling = Some(sampling);
        self
    }
}

/// Uniform generation client over one event source.
pub struct GenClient<S> {
    source: S,
    sampling: Option<SamplingOptions>,
}

impl<S: EventSource> GenClient<S> {
    pub fn builder(source: S) -> GenClientBuilder<S> {
        GenClientBuilder {
            source,
            sampling: None,
        }
    }

    /// Generate free text.
    pub async fn generate_natural_language(&self, params: GenerateParams) -> Result<ReplayStream> {
        self.generate(params, RequestShape::NaturalLanguage).await
    }

    /// Generate a value constrained by `schema`, delivered on the final
    /// event's `data` payload after validation.
    pub async fn generate_structured_data(
        &self,
        params: GenerateParams,
        schema: Schema,
    ) -> Result<ReplayStream> {
        self.generate(params, RequestShape::StructuredData(schema))
            .await
    }

    /// Offer the backend a set of named tools it may call. The final event's
    /// `data` is the chosen `{name, args}` pair, or absent for a free-text
    /// answer.
    pub async fn generate_with_optional_tools(
        &self,
        params: GenerateParams,
        tools: BTreeMap<String, ToolSpec>,
    ) -> Result<ReplayStream> {
        self.generate(params, RequestShape::OptionalTools(tools))
            .await
    }

    async fn generate(&self, params: GenerateParams, shape: RequestShape) -> Result<ReplayStream> {
        let request = pipeline::assemble(
            &params.prompt,
            params.system_prompt.as_deref(),
            &params.extra_messages,
            self.sampling.as_ref(),
            params.sampling.as_ref(),
            shape,
        )?;
        debug!(max_output_tokens = request.sampling.max_output_tokens, "opening generation");
        let events = self.source.open(&request).await?;
        Ok(ReplayStream::new(events))
    }
}

/// Builder for [`GenClient`].
pub struct GenClientBuilder<S> {
    source: S,
    sampling: Option<SamplingOptions>,
}

impl<S: EventSource> GenClientBuilder<S> {
    /// Instance-level sampling overlay, applied between library defaults and
    /// call-level options.
    pub fn with_sampling(mut self, sampling: SamplingOptions) -> Self {
        self.sampling = Some(sampling);
        self
    }

    pub fn build(self) -> GenClient<S> {
        GenClient {
            source: self.source,
            sampling: self.sampling,
        }
    }
}
