//! Core type definitions shared across the pipeline, the broadcaster, and
//! the cache.

pub mod events;
pub mod message;
pub mod tool;
