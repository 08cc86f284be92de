//! End-to-end generation through [`GenClient`] over a scripted backend.

mod support;

use futures::StreamExt;
use omnigen::pipeline::{DirectSource, STRUCTURED_TOOL_NAME};
use omnigen::sampling::SamplingOptions;
use omnigen::schema::Schema;
use omnigen::types::tool::ToolSpec;
use omnigen::{Error, GenClient, GenerateParams, StreamEvent};
use serde_json::json;
use std::collections::BTreeMap;
use support::{MockBackend, RawEvent};

fn client_over(backend: MockBackend) -> GenClient<DirectSource<MockBackend>> {
    support::init_tracing();
    GenClient::builder(DirectSource::new(backend)).build()
}

async fn collect(mut events: omnigen::EventStream) -> Vec<omnigen::Result<StreamEvent>> {
    let mut out = Vec::new();
    while let Some(item) = events.next().await {
        out.push(item);
    }
    out
}

#[tokio::test]
async fn test_natural_language_end_to_end() {
    let backend = MockBackend::new();
    backend.queue_script(MockBackend::script_text(
        "Hello! How can I assist you today?",
    ));
    let client = client_over(backend);

    let stream = client
        .generate_natural_language(GenerateParams::new("Say hello!"))
        .await
        .unwrap();

    let events = collect(stream.subscribe()).await;
    let events: Vec<StreamEvent> = events.into_iter().map(|e| e.unwrap()).collect();

    let mut assembled = String::new();
    for event in &events[..events.len() - 1] {
        match event {
            StreamEvent::Chunk { text } => assembled.push_str(text),
            other => panic!("expected only chunks before the final, got {:?}", other),
        }
    }
    assert_eq!(assembled, "Hello! How can I assist you today?");

    match events.last().unwrap() {
        StreamEvent::Final { text, data, additional_data } => {
            assert_eq!(text, "Hello! How can I assist you today?");
            assert_eq!(*data, None);
            assert_eq!(*additional_data, None);
        }
        other => panic!("expected a final event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_structured_data_end_to_end() {
    let backend = MockBackend::new();
    backend.queue_script(vec![
        RawEvent::Delta("{\"say\":".into()),
        RawEvent::Delta("\"hello\"}".into()),
        RawEvent::Stop { tool_calls: vec![] },
    ]);
    let client = client_over(backend);

    let stream = client
        .generate_structured_data(
            GenerateParams::new("Say hello!"),
            Schema::object([("say", Schema::string())]),
        )
        .await
        .unwrap();

    match stream.result().await.unwrap() {
        StreamEvent::Final { text, data, .. } => {
            assert_eq!(text, "{\"say\":\"hello\"}");
            assert_eq!(data, Some(json!({"say": "hello"})));
        }
        other => panic!("expected a final event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_structured_data_synthesizes_forced_tool() {
    let backend = MockBackend::new();
    let log = backend.call_log();
    backend.queue_script(vec![
        RawEvent::Delta("{\"say\":\"hi\"}".into()),
        RawEvent::Stop { tool_calls: vec![] },
    ]);
    let client = client_over(backend);

    let stream = client
        .generate_structured_data(
            GenerateParams::new("Say hello!").with_system_prompt("Answer as JSON."),
            Schema::object([("say", Schema::string())]),
        )
        .await
        .unwrap();
    stream.result().await.unwrap();

    let calls = log.snapshot();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];

    // System prompt first, then the user prompt.
    assert_eq!(calls[0].messages.len(), 2);
    assert!(call.messages[0].to_string().contains("Answer as JSON."));
    assert!(call.messages[1].to_string().contains("Say hello!"));

    // Structured mode rides on one synthesized tool, and it is forced.
    assert_eq!(call.force_tool.as_deref(), Some(STRUCTURED_TOOL_NAME));
    assert_eq!(call.tools.len(), 1);
    assert_eq!(call.tools[0]["name"], json!(STRUCTURED_TOOL_NAME));
    assert_eq!(call.tools[0]["parameters"]["type"], json!("object"));
}

#[tokio::test]
async fn test_invalid_structured_output_surfaces_validation_error() {
    let backend = MockBackend::new();
    backend.queue_script(vec![
        RawEvent::Delta("{\"say\": 42}".into()),
        RawEvent::Stop { tool_calls: vec![] },
    ]);
    let client = client_over(backend);

    let stream = client
        .generate_structured_data(
            GenerateParams::new("Say hello!"),
            Schema::object([("say", Schema::string())]),
        )
        .await
        .unwrap();

    match stream.result().await.unwrap_err() {
        Error::ResultValidate { raw_text, issues, .. } => {
            assert_eq!(raw_text, "{\"say\": 42}");
            assert_eq!(issues[0].path, "say");
        }
        other => panic!("expected ResultValidate, got {:?}", other),
    }
}

#[tokio::test]
async fn test_optional_tools_free_text_answer() {
    let backend = MockBackend::new();
    backend.queue_script(MockBackend::script_text("No tool needed."));
    let client = client_over(backend);

    let mut tools = BTreeMap::new();
    tools.insert(
        "lookup_weather".to_string(),
        ToolSpec::new(
            "Look up the weather for a city",
            Schema::object([("city", Schema::string())]),
        ),
    );

    let stream = client
        .generate_with_optional_tools(GenerateParams::new("Just answer in text."), tools)
        .await
        .unwrap();

    match stream.result().await.unwrap() {
        StreamEvent::Final { text, data, .. } => {
            assert_eq!(text, "No tool needed.");
            assert_eq!(data, None);
        }
        other => panic!("expected a final event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_optional_tools_chosen_tool_lands_on_data() {
    let backend = MockBackend::new();
    backend.queue_script(vec![RawEvent::Stop {
        tool_calls: vec![
            ("lookup_weather".into(), json!({"city": "Paris"})),
            ("lookup_weather".into(), json!({"city": "Lyon"})),
        ],
    }]);
    let client = client_over(backend);

    let mut tools = BTreeMap::new();
    tools.insert(
        "lookup_weather".to_string(),
        ToolSpec::new(
            "Look up the weather for a city",
            Schema::object([("city", Schema::string())]),
        ),
    );

    let stream = client
        .generate_with_optional_tools(GenerateParams::new("Weather in Paris and Lyon?"), tools)
        .await
        .unwrap();

    match stream.result().await.unwrap() {
        StreamEvent::Final { data, additional_data, .. } => {
            assert_eq!(
                data,
                Some(json!({"name": "lookup_weather", "args": {"city": "Paris"}}))
            );
            assert_eq!(
                additional_data,
                Some(vec![json!({"name": "lookup_weather", "args": {"city": "Lyon"}})])
            );
        }
        other => panic!("expected a final event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_replay_is_identical_for_late_subscriber() {
    let backend = MockBackend::new();
    backend.queue_script(MockBackend::script_text(
        "Hello! How can I assist you today?",
    ));
    let client = client_over(backend);

    let stream = client
        .generate_natural_language(GenerateParams::new("Say hello!"))
        .await
        .unwrap();

    let first: Vec<StreamEvent> = collect(stream.subscribe())
        .await
        .into_iter()
        .map(|e| e.unwrap())
        .collect();
    // Joins after the stream already finished; must see the same sequence.
    let late: Vec<StreamEvent> = collect(stream.subscribe())
        .await
        .into_iter()
        .map(|e| e.unwrap())
        .collect();
    assert_eq!(first, late);
}

#[tokio::test]
async fn test_mid_stream_backend_failure_reaches_every_consumer() {
    let backend = MockBackend::new();
    backend.queue_script(vec![
        RawEvent::Delta("partial".into()),
        RawEvent::Fail("rate limited".into()),
    ]);
    let client = client_over(backend);

    let stream = client
        .generate_natural_language(GenerateParams::new("Say hello!"))
        .await
        .unwrap();

    for _ in 0..2 {
        let events = collect(stream.subscribe()).await;
        assert!(matches!(
            events[0].as_ref().unwrap(),
            StreamEvent::Chunk { text } if text == "partial"
        ));
        match events[1].as_ref().unwrap_err() {
            Error::Backend(msg) => assert_eq!(msg, "rate limited"),
            other => panic!("expected a backend error, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_empty_prompt_is_rejected_before_the_backend() {
    let client = client_over(MockBackend::new());
    match client
        .generate_natural_language(GenerateParams::new(""))
        .await
        .unwrap_err()
    {
        Error::InvalidInput(_) => {}
        other => panic!("expected InvalidInput, got {:?}", other),
    }
}

#[tokio::test]
async fn test_sampling_layers_reach_the_backend_resolved() {
    let backend = MockBackend::new();
    let log = backend.call_log();
    backend.queue_script(MockBackend::script_text("ok"));
    let client = GenClient::builder(DirectSource::new(backend))
        .with_sampling(SamplingOptions::new().with_temperature(0.1))
        .build();

    let stream = client
        .generate_natural_language(
            GenerateParams::new("Say hello!")
                .with_sampling(SamplingOptions::new().with_max_output_tokens(1024)),
        )
        .await
        .unwrap();
    stream.result().await.unwrap();

    let sampling = log.snapshot()[0].sampling;
    // Instance temperature, call token limit, library default topP.
    assert_eq!(sampling.max_output_tokens, 1024);
    assert_eq!(sampling.temperature, 0.1);
    assert_eq!(sampling.top_p, 0.95);
    assert!(!sampling.force_schema_constrained_tokens);
}

#[tokio::test]
async fn test_zero_max_output_tokens_is_rejected() {
    let client = client_over(MockBackend::new());
    match client
        .generate_natural_language(
            GenerateParams::new("hi")
                .with_sampling(SamplingOptions::new().with_max_output_tokens(0)),
        )
        .await
        .unwrap_err()
    {
        Error::InvalidInput(msg) => {
            assert_eq!(msg, "maxOutputTokens must be at least 1 (got: 0)");
        }
        other => panic!("expected InvalidInput, got {:?}", other),
    }
}
