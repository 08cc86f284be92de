//! # omnigen
//!
//! Uniform text and structured-data generation over pluggable LLM backends.
//!
//! This library exposes one call surface for generating free text,
//! schema-constrained structured data, or optional tool calls, independent of
//! which backend answers the call. Backends plug in behind a fixed adapter
//! boundary ([`Backend`]); everything on this side of that boundary is
//! provider-agnostic.
//!
//! ## Key Features
//!
//! - **Replayable streams**: [`ReplayStream`] turns one forward-only event
//!   producer into something any number of consumers can observe identically,
//!   joining at any time.
//! - **Uniform pipeline**: [`GenClient`] resolves sampling options, assembles
//!   messages and tool descriptors, and drives the adapter boundary for all
//!   three generation modes.
//! - **Schema codec**: a restricted schema tree ([`Schema`]) with a lossless
//!   bidirectional mapping to a wire JSON-Schema dialect and full output
//!   validation.
//! - **Transcript cache**: [`cache::CachedSource`] memoizes whole generation
//!   transcripts by a request fingerprint, with at-most-once backend
//!   construction.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use omnigen::{GenClient, GenerateParams};
//! use futures::StreamExt;
//!
//! # async fn example(source: impl omnigen::EventSource + 'static) -> omnigen::Result<()> {
//! let client = GenClient::builder(source).build();
//!
//! let stream = client
//!     .generate_natural_language(GenerateParams::new("Say hello!"))
//!     .await?;
//!
//! let mut events = stream.subscribe();
//! while let Some(event) = events.next().await {
//!     // Chunk { text } events, then exactly one Final
//!     let _ = event?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Core type definitions (messages, events, tools) |
//! | [`sampling`] | Sampling options and three-layer resolution |
//! | [`schema`] | Schema tree, wire codec, and output validation |
//! | [`stream`] | Multi-consumer replayable event streams |
//! | [`pipeline`] | Request assembly and the event-source seam |
//! | [`cache`] | Content-addressed transcript cache |
//! | [`backend`] | The adapter boundary implemented per provider |

pub mod backend;
pub mod cache;
pub mod client;
pub mod pipeline;
pub mod sampling;
pub mod schema;
pub mod stream;
pub mod types;

pub mod error;
pub use error::{Error, Issue, IssueKind};

// Re-export main types for convenience
pub use backend::{Backend, OutputMode, RawRequest};
pub use client::{GenClient, GenClientBuilder, GenerateParams};
pub use pipeline::{EventSource, GenerationRequest};
pub use sampling::{ResolvedSampling, SamplingOptions};
pub use schema::Schema;
pub use stream::ReplayStream;
pub use types::{
    events::{FinalEvent, StreamEvent},
    message::{Content, Message, Role},
    tool::{ToolDescriptor, ToolSpec},
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream of fallible items
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// The event stream shape produced by the adapter boundary and consumed by
/// [`ReplayStream`]: zero or more `Chunk`s then exactly one `Final`.
pub type EventStream = BoxStream<'static, StreamEvent>;
