//! The chat-model interface the host calls into.
//!
//! Adapters implement `generate` and usually `stream`; `invoke` and the
//! single-chunk stream fallback come for free.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::core::SdkError;
use crate::sdk_types::{AiMessage, ChatGenerationChunk, ChatResult, Message, Metadata};

/// Stream of incremental generation chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatGenerationChunk, SdkError>> + Send>>;

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Identifier of the model implementation, for logging.
    fn llm_type(&self) -> &str;

    /// Parameters that distinguish this model instance. Never includes credentials.
    fn identifying_params(&self) -> Metadata {
        Metadata::new()
    }

    /// Run the model over `messages` and return the full result.
    /// `stop`, when given, replaces any stop sequences configured on the model.
    async fn generate(
        &self,
        messages: &[Message],
        stop: Option<&[String]>,
    ) -> Result<ChatResult, SdkError>;

    /// Stream the model's answer chunk by chunk.
    ///
    /// The default runs `generate` and yields its first generation as one chunk.
    async fn stream(
        &self,
        messages: &[Message],
        stop: Option<&[String]>,
    ) -> Result<ChunkStream, SdkError> {
        let result = self.generate(messages, stop).await?;
        let chunk: Option<ChatGenerationChunk> =
            result.generations.into_iter().next().map(Into::into);
        let stream = futures_util::stream::iter(chunk.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    /// Convenience wrapper returning the first generation's message.
    async fn invoke(&self, messages: &[Message]) -> Result<AiMessage, SdkError> {
        let result = self.generate(messages, None).await?;
        result
            .generations
            .into_iter()
            .next()
            .map(|g| g.message)
            .ok_or_else(|| SdkError::malformed("model returned no generations"))
    }
}
