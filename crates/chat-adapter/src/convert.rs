//! Field-by-field mapping between host messages/results and vendor shapes.

use std::time::Duration;

use serde_json::json;

use crate::adapter_core::SdkError;
use crate::sdk_types::{
    AiMessage, AiMessageChunk, ChatGeneration, ChatGenerationChunk, ChatResult, Message, Metadata,
    UsageMetadata,
};
use crate::vendor::api_types::{CompletionChunk, CompletionResponse, RequestMessage, Usage};

/// Map one host message to a vendor request message.
///
/// System, human, AI and free-role chat messages are supported. Tool and
/// function messages are rejected with `SdkError::UnsupportedMessage`.
pub fn convert_message(message: &Message) -> Result<RequestMessage, SdkError> {
    let converted = match message {
        Message::System { content } => RequestMessage::new("system", content.as_str()),
        Message::Human { content } => RequestMessage::new("user", content.as_str()),
        Message::Ai(ai) => RequestMessage::new("assistant", ai.content.as_str()),
        Message::Chat { role, content } => RequestMessage::new(role.as_str(), content.as_str()),
        Message::Tool { .. } | Message::Function { .. } => {
            return Err(SdkError::unsupported_message(message.kind()))
        }
    };
    Ok(converted)
}

/// Map a whole prompt, failing on the first unsupported message.
pub fn convert_messages(messages: &[Message]) -> Result<Vec<RequestMessage>, SdkError> {
    messages.iter().map(convert_message).collect()
}

pub fn usage_metadata(usage: &Usage) -> UsageMetadata {
    UsageMetadata {
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
        total_tokens: usage.total(),
    }
}

/// Seconds with millisecond precision.
pub fn elapsed_seconds(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}

/// Wrap a non-streaming vendor response as a host `ChatResult`.
///
/// Every choice becomes a generation with timing in its message metadata.
/// Usage covers the whole call, so only the first generation carries it.
/// A response without choices is malformed.
pub fn build_chat_result(
    response: CompletionResponse,
    elapsed: Duration,
) -> Result<ChatResult, SdkError> {
    if response.choices.is_empty() {
        return Err(SdkError::malformed("response contained no choices"));
    }
    let usage = response.usage.as_ref().map(usage_metadata);

    let generations = response
        .choices
        .iter()
        .enumerate()
        .map(|(i, choice)| {
            let mut response_metadata = Metadata::new();
            response_metadata.insert("time_in_seconds".into(), json!(elapsed_seconds(elapsed)));
            if let Some(model) = &response.model {
                response_metadata.insert("model_name".into(), json!(model));
            }
            if let Some(id) = &response.id {
                response_metadata.insert("id".into(), json!(id));
            }
            response_metadata.insert("finish_reason".into(), json!(choice.finish_reason));

            let mut generation_info = Metadata::new();
            generation_info.insert("finish_reason".into(), json!(choice.finish_reason));

            ChatGeneration {
                message: AiMessage {
                    content: choice.message.content.clone().unwrap_or_default(),
                    usage_metadata: if i == 0 { usage } else { None },
                    response_metadata,
                },
                generation_info: Some(generation_info),
            }
        })
        .collect();

    let mut llm_output = Metadata::new();
    if let Some(u) = &response.usage {
        llm_output.insert(
            "token_usage".into(),
            json!({
                "prompt_tokens": u.prompt_tokens,
                "completion_tokens": u.completion_tokens,
                "total_tokens": u.total(),
            }),
        );
    }
    if let Some(model) = &response.model {
        llm_output.insert("model_name".into(), json!(model));
    }

    Ok(ChatResult {
        generations,
        llm_output: Some(llm_output),
    })
}

/// One host chunk for a vendor chunk that carries a choice.
///
/// Text is `choices[0].delta.content`, empty when the delta has none (e.g.
/// the role-only opening delta). Chunks without choices, such as the
/// usage-bearing terminal chunk, yield `None`.
pub fn chunk_from_delta(chunk: &CompletionChunk) -> Option<ChatGenerationChunk> {
    let choice = chunk.choices.first()?;
    let mut out = ChatGenerationChunk::new(AiMessageChunk::new(
        choice.delta.content.clone().unwrap_or_default(),
    ));
    if let Some(reason) = &choice.finish_reason {
        let mut info = Metadata::new();
        info.insert("finish_reason".into(), json!(reason));
        out.generation_info = Some(info);
    }
    Some(out)
}

/// The trailing metadata-only chunk closing a stream: no text, the reported
/// usage (if any) and the call's timing.
pub fn metadata_chunk(
    usage: Option<UsageMetadata>,
    model: Option<&str>,
    finish_reason: Option<&str>,
    elapsed: Duration,
) -> ChatGenerationChunk {
    let mut response_metadata = Metadata::new();
    response_metadata.insert("time_in_seconds".into(), json!(elapsed_seconds(elapsed)));
    if let Some(model) = model {
        response_metadata.insert("model_name".into(), json!(model));
    }
    if let Some(reason) = finish_reason {
        response_metadata.insert("finish_reason".into(), json!(reason));
    }
    ChatGenerationChunk::new(AiMessageChunk {
        content: String::new(),
        usage_metadata: usage,
        response_metadata,
    })
}
