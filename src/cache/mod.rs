//! Content-addressed transcript cache.
//!
//! Whole generation transcripts are memoized by a fingerprint of the
//! semantically relevant request fields. A hit replays the persisted events
//! through the normal [`ReplayStream`](crate::ReplayStream) path without
//! ever constructing the real backend; a miss lazily builds the backend (at
//! most once per cache instance), drives real generation, and persists the
//! transcript once a well-formed `Final` event has been observed.

mod fingerprint;
mod source;
mod store;

pub use fingerprint::fingerprint;
pub use source::{CacheStats, CachedSource};
pub use store::{CacheConfig, CacheEntry, CacheLookup, RequestEcho, TranscriptStore};
