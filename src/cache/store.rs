//! On-disk transcript storage.
//!
//! One file per fingerprint, `<prefix>-<hexDigest>.<ext>`, inside a
//! configured directory created recursively on first write. The body is
//! pretty-printed JSON — a request echo plus the ordered event list — so
//! cached transcripts stay human-diffable.

use crate::pipeline::GenerationRequest;
use crate::sampling::ResolvedSampling;
use crate::types::events::StreamEvent;
use crate::types::message::Message;
use crate::types::tool::ToolDescriptor;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Transcript store configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub dir: PathBuf,
    pub file_prefix: String,
    pub file_ext: String,
}

impl CacheConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            file_prefix: "gen".into(),
            file_ext: "json".into(),
        }
    }

    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    pub fn with_file_ext(mut self, ext: impl Into<String>) -> Self {
        self.file_ext = ext.into();
        self
    }
}

/// The request fields echoed into a persisted transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEcho {
    pub messages: Vec<Message>,
    pub sampling: ResolvedSampling,
    pub tools: Vec<ToolDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_tool: Option<String>,
}

impl From<&GenerationRequest> for RequestEcho {
    fn from(request: &GenerationRequest) -> Self {
        Self {
            messages: request.messages.clone(),
            sampling: request.sampling,
            tools: request.tools.clone(),
            force_tool: request.force_tool.clone(),
        }
    }
}

/// One persisted transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub request: RequestEcho,
    pub events: Vec<StreamEvent>,
}

/// Outcome of a fingerprint lookup.
#[derive(Debug)]
pub enum CacheLookup {
    /// A persisted transcript exists; replay these events.
    Hit(Vec<StreamEvent>),
    /// Nothing persisted; real generation is required.
    Miss,
}

/// File-per-fingerprint transcript storage.
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    config: CacheConfig,
}

impl TranscriptStore {
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    pub fn path_for(&self, fingerprint: &str) -> PathBuf {
        self.config.dir.join(format!(
            "{}-{}.{}",
            self.config.file_prefix, fingerprint, self.config.file_ext
        ))
    }

    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    /// Read the transcript for `fingerprint`, if one is persisted.
    ///
    /// An unreadable or unparseable file counts as a miss: the entry will be
    /// overwritten by the next successful run with the same key.
    pub async fn lookup(&self, fingerprint: &str) -> Result<CacheLookup> {
        let path = self.path_for(fingerprint);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CacheLookup::Miss),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) => Ok(CacheLookup::Hit(entry.events)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupt transcript");
                Ok(CacheLookup::Miss)
            }
        }
    }

    /// Persist a completed transcript. Concurrent writers of the same
    /// fingerprint are not coordinated; the last write wins.
    pub async fn persist(&self, fingerprint: &str, entry: &CacheEntry) -> Result<()> {
        tokio::fs::create_dir_all(&self.config.dir).await?;
        let body = serde_json::to_string_pretty(entry)?;
        tokio::fs::write(self.path_for(fingerprint), body).await?;
        Ok(())
    }
}
