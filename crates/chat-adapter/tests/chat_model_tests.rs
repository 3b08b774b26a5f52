use crate::adapter_core::error::TransportError;
use crate::adapter_core::{collect_chunks, ChatModel, SdkError};
use crate::chat_adapter::{ChatCompletionsAdapter, ChatCompletionsOptions};
use crate::sdk_types::{Message, UsageMetadata};
use crate::vendor::client::ChatCompletionsClient;
use crate::vendor::config::ClientConfig;
use crate::vendor::test_transport::{http_status, sse_data, sse_done, TestTransport};
use futures_util::StreamExt;
use serde_json::json;
use std::time::Duration;

fn adapter(
    options: ChatCompletionsOptions,
    transport: &TestTransport,
) -> ChatCompletionsAdapter<TestTransport> {
    let cfg = options.apply_to(ClientConfig {
        api_key: Some("sk-test".into()),
        ..ClientConfig::default()
    });
    ChatCompletionsAdapter::with_client(
        options,
        ChatCompletionsClient::with_transport(cfg, transport.clone()),
    )
}

fn prompt() -> Vec<Message> {
    vec![
        Message::system("Answer in one word."),
        Message::human("Capital of France?"),
    ]
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "model": "gpt-4o-mini-2024-07-18",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 18, "completion_tokens": 2, "total_tokens": 20}
    })
}

fn delta(content: &str) -> bytes::Bytes {
    sse_data(json!({
        "model": "gpt-4o-mini-2024-07-18",
        "choices": [{"index": 0, "delta": {"content": content}, "finish_reason": null}]
    }))
}

fn stream_opts() -> ChatCompletionsOptions {
    ChatCompletionsOptions::new("gpt-4o-mini").max_retries(0)
}

#[tokio::test]
async fn generate_sends_configured_request() {
    let transport = TestTransport::new().reply_json(completion("Paris"));
    let model = adapter(
        ChatCompletionsOptions::new("gpt-4o-mini")
            .temperature(0.2)
            .max_tokens(16)
            .timeout(Duration::from_secs(9))
            .stop(["\n"]),
        &transport,
    );

    let result = model.generate(&prompt(), None).await.unwrap();
    assert_eq!(result.generations[0].text(), "Paris");

    let req = transport.last_request();
    assert!(!req.is_stream);
    assert!(req.url.ends_with("/chat/completions"));
    assert_eq!(req.header("authorization"), Some("Bearer sk-test"));
    assert_eq!(req.request_timeout, Some(Duration::from_secs(9)));
    assert_eq!(
        req.body,
        json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": "Answer in one word."},
                {"role": "user", "content": "Capital of France?"}
            ],
            "temperature": 0.2,
            "max_tokens": 16,
            "stop": ["\n"]
        })
    );
}

#[tokio::test]
async fn per_call_stop_replaces_configured_stop() {
    let transport = TestTransport::new()
        .reply_json(completion("a"))
        .reply_json(completion("b"));
    let model = adapter(ChatCompletionsOptions::new("m").stop(["END"]), &transport);

    let stop = vec!["###".to_string()];
    let empty: Vec<String> = Vec::new();
    model.generate(&prompt(), Some(stop.as_slice())).await.unwrap();
    model.generate(&prompt(), Some(empty.as_slice())).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0].body["stop"], json!(["###"]));
    assert_eq!(requests[1].body["stop"], json!(["END"]));
}

#[tokio::test]
async fn generate_reports_vendor_usage_and_timing() {
    let transport = TestTransport::new().reply_json(completion("Paris"));
    let model = adapter(ChatCompletionsOptions::new("gpt-4o-mini"), &transport);

    let result = model.generate(&prompt(), None).await.unwrap();
    let message = &result.generations[0].message;
    assert_eq!(
        message.usage_metadata,
        Some(UsageMetadata {
            input_tokens: 18,
            output_tokens: 2,
            total_tokens: 20,
        })
    );
    let secs = message.response_metadata["time_in_seconds"].as_f64().unwrap();
    assert!(secs >= 0.0);
    assert_eq!(
        result.llm_output.unwrap()["model_name"],
        json!("gpt-4o-mini-2024-07-18")
    );
}

#[tokio::test]
async fn unsupported_message_fails_before_any_request() {
    let transport = TestTransport::new();
    let model = adapter(ChatCompletionsOptions::new("m"), &transport);

    let messages = vec![Message::human("hi"), Message::tool("42", "call_1")];
    let err = model.generate(&messages, None).await.unwrap_err();
    match err {
        SdkError::UnsupportedMessage { kind } => assert_eq!(kind, "tool"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(model.stream(&messages, None).await.is_err());
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn vendor_errors_propagate_from_generate() {
    let transport = TestTransport::new().reply_error(http_status(
        401,
        r#"{"error":{"message":"Incorrect API key provided"}}"#,
    ));
    let model = adapter(stream_opts(), &transport);
    assert!(matches!(
        model.generate(&prompt(), None).await,
        Err(SdkError::Unauthorized)
    ));
}

#[tokio::test]
async fn stream_yields_deltas_then_one_metadata_chunk() {
    let transport = TestTransport::new().reply_sse(vec![
        sse_data(json!({
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{"index": 0, "delta": {"role": "assistant"}, "finish_reason": null}]
        })),
        delta("Par"),
        delta("is"),
        sse_data(json!({
            "choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]
        })),
        sse_data(json!({
            "choices": [],
            "usage": {"prompt_tokens": 18, "completion_tokens": 2, "total_tokens": 20}
        })),
        sse_done(),
    ]);
    let model = adapter(stream_opts(), &transport);

    let chunks: Vec<_> = model
        .stream(&prompt(), None)
        .await
        .unwrap()
        .map(|c| c.unwrap())
        .collect()
        .await;

    let texts: Vec<_> = chunks.iter().map(|c| c.text()).collect();
    assert_eq!(texts, vec!["", "Par", "is", "", ""]);
    let metadata_only: Vec<_> = chunks.iter().filter(|c| c.is_metadata_only()).collect();
    assert_eq!(metadata_only.len(), 1);

    let last = chunks.last().unwrap();
    assert!(last.is_metadata_only());
    assert_eq!(last.message.usage_metadata, Some(UsageMetadata::new(18, 2)));
    assert_eq!(last.message.response_metadata["finish_reason"], json!("stop"));
    assert!(last.message.response_metadata.contains_key("time_in_seconds"));

    let req = transport.last_request();
    assert!(req.is_stream);
    assert_eq!(req.body["stream"], json!(true));
    assert_eq!(req.body["stream_options"], json!({"include_usage": true}));
}

#[tokio::test]
async fn collected_stream_matches_full_text_and_usage() {
    let transport = TestTransport::new().reply_sse(vec![
        delta("Hel"),
        delta("lo"),
        sse_data(json!({
            "choices": [],
            "usage": {"prompt_tokens": 4, "completion_tokens": 2, "total_tokens": 6}
        })),
        sse_done(),
    ]);
    let model = adapter(stream_opts(), &transport);

    let merged = collect_chunks(model.stream(&prompt(), None).await.unwrap())
        .await
        .unwrap();
    assert_eq!(merged.text(), "Hello");
    assert_eq!(merged.message.usage_metadata, Some(UsageMetadata::new(4, 2)));
}

#[tokio::test]
async fn stream_without_usage_still_ends_with_metadata_chunk() {
    let transport = TestTransport::new().reply_sse(vec![delta("x"), sse_done()]);
    let model = adapter(stream_opts(), &transport);

    let chunks: Vec<_> = model.stream(&prompt(), None).await.unwrap().collect().await;
    assert_eq!(chunks.len(), 2);
    let last = chunks[1].as_ref().unwrap();
    assert!(last.is_metadata_only());
    assert!(last.message.usage_metadata.is_none());
    assert_eq!(
        last.message.response_metadata["model_name"],
        json!("gpt-4o-mini-2024-07-18")
    );
}

#[tokio::test]
async fn mid_stream_failure_ends_without_metadata_chunk() {
    let transport = TestTransport::new()
        .reply_sse_then_error(vec![delta("Par")], TransportError::BodyRead("reset".into()));
    let model = adapter(stream_opts(), &transport);

    let items: Vec<_> = model.stream(&prompt(), None).await.unwrap().collect().await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap().text(), "Par");
    assert!(items[1].is_err());
}

#[tokio::test]
async fn initial_stream_failure_is_returned_from_stream() {
    let transport = TestTransport::new().reply_error(http_status(500, "boom"));
    let model = adapter(stream_opts(), &transport);
    match model.stream(&prompt(), None).await {
        Err(SdkError::Upstream { status, .. }) => assert_eq!(status, 500),
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("expected an error"),
    }
}

#[tokio::test]
async fn invoke_returns_first_message() {
    let transport = TestTransport::new().reply_json(completion("Paris"));
    let model = adapter(ChatCompletionsOptions::new("m"), &transport);
    let message = model.invoke(&prompt()).await.unwrap();
    assert_eq!(message.content, "Paris");
    assert_eq!(message.usage_metadata.map(|u| u.total_tokens), Some(20));
}

#[test]
fn identifies_itself_without_secrets() {
    let transport = TestTransport::new();
    let model = adapter(
        ChatCompletionsOptions::new("gpt-4o-mini")
            .temperature(0.0)
            .api_key("sk-secret"),
        &transport,
    );
    assert_eq!(model.llm_type(), "openai-compatible-chat");
    let params = model.identifying_params();
    assert_eq!(params["model_name"], json!("gpt-4o-mini"));
    assert_eq!(params["temperature"], json!(0.0));
    assert!(!params.contains_key("api_key"));
}
