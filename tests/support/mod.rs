//! Scripted mock backend shared by the integration tests.
//!
//! The mock implements the full adapter boundary: messages, schemas, and
//! tools are translated to plain JSON shapes, and each generation call pops
//! one pre-queued raw event script. Every call records the raw request so
//! tests can assert what crossed the boundary.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use omnigen::backend::{Backend, OutputMode, RawRequest, RawEventStream};
use omnigen::sampling::ResolvedSampling;
use omnigen::schema::Schema;
use omnigen::types::message::Message;
use omnigen::types::tool::ToolDescriptor;
use omnigen::{Error, EventStream, Result, StreamEvent};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Install a subscriber once per test binary; `RUST_LOG` filters output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One raw event in the mock's provider dialect.
#[derive(Debug, Clone)]
pub enum RawEvent {
    /// A text delta.
    Delta(String),
    /// End of generation, optionally with chosen tool calls.
    Stop { tool_calls: Vec<(String, Value)> },
    /// A mid-stream provider failure.
    Fail(String),
}

/// What the mock saw cross the adapter boundary on one call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Value>,
    pub sampling: ResolvedSampling,
    pub tools: Vec<Value>,
    pub force_tool: Option<String>,
}

/// A handle onto the call log that survives handing the backend to a client.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<RecordedCall>>>);

impl CallLog {
    pub fn snapshot(&self) -> Vec<RecordedCall> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct MockBackend {
    scripts: Mutex<VecDeque<Vec<RawEvent>>>,
    calls: CallLog,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_script(&self, events: Vec<RawEvent>) {
        self.scripts.lock().unwrap().push_back(events);
    }

    pub fn call_log(&self) -> CallLog {
        self.calls.clone()
    }

    /// A script that streams `text` in short deltas then stops cleanly.
    pub fn script_text(text: &str) -> Vec<RawEvent> {
        let mut events = Vec::new();
        let mut rest = text;
        while !rest.is_empty() {
            let cut = rest
                .char_indices()
                .nth(6)
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            events.push(RawEvent::Delta(rest[..cut].to_string()));
            rest = &rest[cut..];
        }
        events.push(RawEvent::Stop { tool_calls: vec![] });
        events
    }
}

#[async_trait]
impl Backend for MockBackend {
    type RawMessage = Value;
    type RawSchema = Value;
    type RawTool = Value;
    type RawEvent = RawEvent;

    fn to_raw_messages(&self, messages: &[Message]) -> Result<Vec<Value>> {
        messages
            .iter()
            .map(|m| serde_json::to_value(m).map_err(Into::into))
            .collect()
    }

    fn to_raw_schema(&self, schema: &Schema) -> Result<Value> {
        Ok(schema.to_wire())
    }

    fn to_raw_tool(&self, tool: &ToolDescriptor) -> Result<Value> {
        Ok(json!({
            "name": tool.name,
            "description": tool.description,
            "parameters": self.to_raw_schema(&tool.parameters)?,
        }))
    }

    async fn generate_raw_events(
        &self,
        request: RawRequest<'_, Self>,
    ) -> Result<RawEventStream<RawEvent>> {
        self.calls.0.lock().unwrap().push(RecordedCall {
            messages: request.messages.clone(),
            sampling: *request.sampling,
            tools: request.tools.clone(),
            force_tool: request.force_tool.map(String::from),
        });
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .expect("no script queued for generate_raw_events");
        Ok(Box::pin(futures::stream::iter(script.into_iter().map(Ok))))
    }

    fn from_raw_events(&self, mode: &OutputMode, raw: RawEventStream<RawEvent>) -> EventStream {
        let tool_mode = matches!(mode, OutputMode::OptionalTools);
        let state = (raw, String::new());
        Box::pin(futures::stream::unfold(
            state,
            move |(mut raw, mut acc)| async move {
                let item = raw.next().await?;
                let out = match item {
                    Ok(RawEvent::Delta(text)) => {
                        acc.push_str(&text);
                        Ok(StreamEvent::Chunk { text })
                    }
                    Ok(RawEvent::Stop { mut tool_calls }) => {
                        let (data, additional_data) = if tool_mode && !tool_calls.is_empty() {
                            let rest: Vec<Value> = tool_calls
                                .split_off(1)
                                .into_iter()
                                .map(|(name, args)| json!({"name": name, "args": args}))
                                .collect();
                            let (name, args) = tool_calls.remove(0);
                            (
                                Some(json!({"name": name, "args": args})),
                                if rest.is_empty() { None } else { Some(rest) },
                            )
                        } else {
                            (None, None)
                        };
                        Ok(StreamEvent::Final {
                            text: std::mem::take(&mut acc),
                            data,
                            additional_data,
                        })
                    }
                    Ok(RawEvent::Fail(message)) => Err(Error::Backend(message)),
                    Err(e) => Err(e),
                };
                Some((out, (raw, acc)))
            },
        ))
    }
}
