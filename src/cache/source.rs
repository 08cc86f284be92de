//! The caching decorator over the event-source seam.

use super::fingerprint::fingerprint;
use super::store::{CacheConfig, CacheEntry, CacheLookup, RequestEcho, TranscriptStore};
use crate::pipeline::{EventSource, GenerationRequest};
use crate::types::events::StreamEvent;
use crate::{EventStream, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::StreamExt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

type SourceFactory = Box<dyn Fn() -> BoxFuture<'static, Result<Box<dyn EventSource>>> + Send + Sync>;

/// Hit/miss counters for one cache instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// An [`EventSource`] that memoizes whole transcripts by request
/// fingerprint.
///
/// The inner source is built lazily, at most once per cache instance, no
/// matter how many distinct fingerprints miss — and never at all on an
/// all-hit workload, so credentials and backend setup are not required when
/// every response is already cached.
pub struct CachedSource {
    store: TranscriptStore,
    factory: SourceFactory,
    inner: OnceCell<Box<dyn EventSource>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedSource {
    /// Create a cache over `config`, deferring inner-source construction to
    /// `factory` until the first miss.
    pub fn new<F, Fut, S>(config: CacheConfig, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<S>> + Send + 'static,
        S: EventSource + 'static,
    {
        let factory: SourceFactory = Box::new(move || {
            let fut = factory();
            Box::pin(async move { Ok(Box::new(fut.await?) as Box<dyn EventSource>) })
        });
        Self {
            store: TranscriptStore::new(config),
            factory,
            inner: OnceCell::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl EventSource for CachedSource {
    async fn open(&self, request: &GenerationRequest) -> Result<EventStream> {
        let key = fingerprint(request)?;

        match self.store.lookup(&key).await? {
            CacheLookup::Hit(events) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(fingerprint = %key, "transcript cache hit");
                Ok(Box::pin(futures::stream::iter(events.into_iter().map(Ok))))
            }
            CacheLookup::Miss => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(fingerprint = %key, "transcript cache miss");
                let inner = self.inner.get_or_try_init(|| (self.factory)()).await?;
                let live = inner.open(request).await?;
                Ok(tap_and_persist(
                    live,
                    self.store.clone(),
                    key,
                    RequestEcho::from(request),
                ))
            }
        }
    }
}

struct Tap {
    inner: EventStream,
    store: TranscriptStore,
    fingerprint: String,
    echo: RequestEcho,
    seen: Vec<StreamEvent>,
}

/// Accumulate events as the caller drains the live stream; persist the
/// transcript once a well-formed `Final` arrives. A stream that errors or
/// ends early leaves no cache file — partial transcripts are never replayed.
fn tap_and_persist(
    inner: EventStream,
    store: TranscriptStore,
    fingerprint: String,
    echo: RequestEcho,
) -> EventStream {
    let tap = Tap {
        inner,
        store,
        fingerprint,
        echo,
        seen: Vec::new(),
    };
    Box::pin(futures::stream::unfold(tap, |mut tap| async move {
        let item = tap.inner.next().await?;
        if let Ok(event) = &item {
            tap.seen.push(event.clone());
            if event.is_final() {
                let entry = CacheEntry {
                    request: tap.echo.clone(),
                    events: std::mem::take(&mut tap.seen),
                };
                // A failed write must not fail an otherwise successful
                // generation.
                if let Err(e) = tap.store.persist(&tap.fingerprint, &entry).await {
                    warn!(fingerprint = %tap.fingerprint, error = %e, "transcript persist failed");
                }
            }
        }
        Some((item, tap))
    }))
}
