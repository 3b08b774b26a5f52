use std::pin::Pin;

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use serde_json::Value as JsonValue;

use crate::adapter_core::transport::ByteStream;
use crate::adapter_core::SdkError;
use crate::sse::{SseDecoder, SseEvent};
use crate::vendor::api_types::CompletionChunk;
use crate::vendor::error::map_transport_error_to_sdk_error;

/// Decoded chat-completion chunks, in arrival order.
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<CompletionChunk, SdkError>> + Send>>;

/// Turn a raw SSE body into completion chunks.
///
/// Ends at `[DONE]` or when the body closes. Transport failures, unparseable
/// events and in-band `{"error": ...}` payloads end the stream with an error.
pub fn decode_completion_stream(bytes_stream: ByteStream) -> CompletionStream {
    Box::pin(try_stream! {
        let mut decoder = SseDecoder::new();
        let mut inner = bytes_stream;
        let mut done = false;

        while let Some(chunk) = inner.next().await {
            let chunk = chunk.map_err(map_transport_error_to_sdk_error)?;
            for ev in decoder.push(&chunk) {
                if ev.is_done() {
                    done = true;
                    break;
                }
                yield parse_event(&ev)?;
            }
            if done {
                break;
            }
        }

        if !done {
            for ev in decoder.finish() {
                if ev.is_done() {
                    break;
                }
                yield parse_event(&ev)?;
            }
        }
    })
}

fn parse_event(ev: &SseEvent) -> Result<CompletionChunk, SdkError> {
    let val: JsonValue = serde_json::from_slice(&ev.data)?;
    // Some servers send `"error": null` on every normal chunk.
    if let Some(err) = val.get("error").filter(|e| !e.is_null()) {
        let message = err
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        return Err(SdkError::Upstream {
            status: 200,
            message,
            source: None,
        });
    }
    Ok(serde_json::from_value(val)?)
}
