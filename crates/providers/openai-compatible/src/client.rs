use std::time::Instant;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::adapter_core::retry::{retry_with_backoff, RetryConfig};
use crate::adapter_core::transport::HttpTransport;
use crate::adapter_core::SdkError;
use crate::reqwest_transport::ReqwestTransport;
use crate::vendor::api_types::{CompletionRequest, CompletionResponse, StreamOptions};
use crate::vendor::config::ClientConfig;
use crate::vendor::error::map_transport_error_to_sdk_error;
use crate::vendor::stream::{decode_completion_stream, CompletionStream};

const LOG_TARGET: &str = "chat_adapter::openai_compatible";

/// Chat-completions client over any `HttpTransport`.
pub struct ChatCompletionsClient<T: HttpTransport = ReqwestTransport> {
    cfg: ClientConfig,
    http: T,
}

impl ChatCompletionsClient<ReqwestTransport> {
    /// Client over a fresh `reqwest` transport built from `cfg.transport`.
    pub fn new(cfg: ClientConfig) -> Result<Self, SdkError> {
        let http = ReqwestTransport::try_new(&cfg.transport).map_err(SdkError::Transport)?;
        Ok(Self { cfg, http })
    }
}

impl<T: HttpTransport> ChatCompletionsClient<T> {
    pub fn with_transport(cfg: ClientConfig, http: T) -> Self {
        Self { cfg, http }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.cfg
    }

    /// Request a complete response.
    pub async fn create(&self, request: &CompletionRequest) -> Result<CompletionResponse, SdkError> {
        let mut body = serde_json::to_value(request)?;
        if let Some(map) = body.as_object_mut() {
            map.remove("stream");
            map.remove("stream_options");
        }

        let url = self.cfg.endpoint_url();
        let headers = self.cfg.request_headers();
        let transport_cfg = self.cfg.transport.with_request_timeout(request.timeout);
        let started = Instant::now();
        debug!(target: LOG_TARGET, model = %request.model, messages = request.messages.len(), "chat completion request");

        let (http, url, headers, body, transport_cfg) =
            (&self.http, url.as_str(), headers.as_slice(), &body, &transport_cfg);
        let json = retry_with_backoff(
            &self.retry_config(),
            move || async move {
                http.post_json(url, headers, body, transport_cfg)
                    .await
                    .map_err(map_transport_error_to_sdk_error)
            },
            |attempt, delay, err| log_retry(attempt, delay, err),
        )
        .await?;

        let response: CompletionResponse = serde_json::from_value(json)?;
        debug!(
            target: LOG_TARGET,
            model = %request.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            choices = response.choices.len(),
            "chat completion finished"
        );
        Ok(response)
    }

    /// Request a streamed response. Usage is requested in the terminal chunk
    /// unless the caller set `stream_options` explicitly.
    pub async fn create_stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionStream, SdkError> {
        let mut request = request.clone();
        request.stream = Some(true);
        if request.stream_options.is_none() {
            request.stream_options = Some(StreamOptions {
                include_usage: true,
            });
        }
        let body: JsonValue = serde_json::to_value(&request)?;

        let url = self.cfg.endpoint_url();
        let headers = self.cfg.request_headers();
        let transport_cfg = self.cfg.transport.with_request_timeout(request.timeout);
        debug!(target: LOG_TARGET, model = %request.model, messages = request.messages.len(), "chat completion stream request");

        let (http, url, headers, body, transport_cfg) =
            (&self.http, url.as_str(), headers.as_slice(), &body, &transport_cfg);
        let bytes = retry_with_backoff(
            &self.retry_config(),
            move || async move {
                http.post_json_stream(url, headers, body, transport_cfg)
                    .await
                    .map_err(map_transport_error_to_sdk_error)
            },
            |attempt, delay, err| log_retry(attempt, delay, err),
        )
        .await?;

        Ok(decode_completion_stream(bytes))
    }

    fn retry_config(&self) -> RetryConfig {
        RetryConfig::with_max_retries(self.cfg.max_retries)
    }
}

fn log_retry(attempt: u32, delay: std::time::Duration, err: &SdkError) {
    warn!(
        target: LOG_TARGET,
        attempt,
        delay_ms = delay.as_millis() as u64,
        error = %err,
        "retrying chat completion request"
    );
}
