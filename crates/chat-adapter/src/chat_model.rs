use std::time::Instant;

use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::debug;

use crate::adapter_core::transport::HttpTransport;
use crate::adapter_core::{ChatModel, ChunkStream, SdkError};
use crate::chat_adapter::convert::{
    build_chat_result, chunk_from_delta, convert_messages, metadata_chunk, usage_metadata,
};
use crate::chat_adapter::options::ChatCompletionsOptions;
use crate::reqwest_transport::ReqwestTransport;
use crate::sdk_types::{ChatResult, Message, Metadata, UsageMetadata};
use crate::vendor::api_types::CompletionRequest;
use crate::vendor::client::ChatCompletionsClient;
use crate::vendor::config::API_KEY_ENV;

const LOG_TARGET: &str = "chat_adapter::adapter";

/// Host chat model backed by an OpenAI-compatible chat-completions API.
pub struct ChatCompletionsAdapter<T: HttpTransport = ReqwestTransport> {
    options: ChatCompletionsOptions,
    client: ChatCompletionsClient<T>,
}

impl ChatCompletionsAdapter<ReqwestTransport> {
    /// Build over a `reqwest` transport. The API key comes from the options,
    /// else from `OPENAI_API_KEY`; having neither is an error.
    pub fn new(options: ChatCompletionsOptions) -> Result<Self, SdkError> {
        let cfg = options.client_config();
        if cfg.api_key.is_none() {
            return Err(SdkError::InvalidArgument {
                message: format!("no API key: set `api_key` or {API_KEY_ENV}"),
            });
        }
        let client = ChatCompletionsClient::new(cfg)?;
        Ok(Self { options, client })
    }
}

impl<T: HttpTransport> ChatCompletionsAdapter<T> {
    /// Build around an existing vendor client.
    pub fn with_client(options: ChatCompletionsOptions, client: ChatCompletionsClient<T>) -> Self {
        Self { options, client }
    }

    pub fn options(&self) -> &ChatCompletionsOptions {
        &self.options
    }

    /// Vendor request for `messages`. A per-call `stop` replaces the
    /// configured stop sequences.
    fn build_request(
        &self,
        messages: &[Message],
        stop: Option<&[String]>,
    ) -> Result<CompletionRequest, SdkError> {
        let stop = stop
            .filter(|s| !s.is_empty())
            .map(<[String]>::to_vec)
            .or_else(|| self.options.stop.clone());
        Ok(CompletionRequest {
            model: self.options.model.clone(),
            messages: convert_messages(messages)?,
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
            stop,
            stream: None,
            stream_options: None,
            timeout: self.options.timeout,
        })
    }
}

#[async_trait]
impl<T: HttpTransport> ChatModel for ChatCompletionsAdapter<T> {
    fn llm_type(&self) -> &str {
        "openai-compatible-chat"
    }

    fn identifying_params(&self) -> Metadata {
        self.options.identifying_params()
    }

    async fn generate(
        &self,
        messages: &[Message],
        stop: Option<&[String]>,
    ) -> Result<ChatResult, SdkError> {
        let request = self.build_request(messages, stop)?;
        let started = Instant::now();
        let response = self.client.create(&request).await?;
        let elapsed = started.elapsed();
        debug!(
            target: LOG_TARGET,
            llm_type = self.llm_type(),
            model = %request.model,
            elapsed_ms = elapsed.as_millis() as u64,
            "generate finished"
        );
        build_chat_result(response, elapsed)
    }

    async fn stream(
        &self,
        messages: &[Message],
        stop: Option<&[String]>,
    ) -> Result<ChunkStream, SdkError> {
        let request = self.build_request(messages, stop)?;
        let started = Instant::now();
        let mut vendor = self.client.create_stream(&request).await?;
        let requested_model = request.model;

        let stream = try_stream! {
            let mut usage: Option<UsageMetadata> = None;
            let mut model: Option<String> = None;
            let mut finish_reason: Option<String> = None;
            let mut deltas = 0usize;

            while let Some(chunk) = vendor.next().await {
                let chunk = chunk?;
                if let Some(u) = &chunk.usage {
                    usage = Some(usage_metadata(u));
                }
                if chunk.model.is_some() {
                    model = chunk.model.clone();
                }
                if let Some(reason) = chunk.choices.first().and_then(|c| c.finish_reason.clone()) {
                    finish_reason = Some(reason);
                }
                if let Some(out) = chunk_from_delta(&chunk) {
                    deltas += 1;
                    yield out;
                }
            }

            let elapsed = started.elapsed();
            debug!(
                target: LOG_TARGET,
                model = %requested_model,
                deltas,
                has_usage = usage.is_some(),
                elapsed_ms = elapsed.as_millis() as u64,
                "stream finished"
            );
            yield metadata_chunk(
                usage,
                model.as_deref().or(Some(requested_model.as_str())),
                finish_reason.as_deref(),
                elapsed,
            );
        };
        Ok(Box::pin(stream))
    }
}
