use futures_util::StreamExt;

use crate::core::{ChunkStream, SdkError};
use crate::sdk_types::{ChatGenerationChunk, ChatResult};

/// Fold a chunk stream into a single chunk. Stops at the first error.
pub async fn collect_chunks(mut stream: ChunkStream) -> Result<ChatGenerationChunk, SdkError> {
    let mut acc = ChatGenerationChunk::default();
    while let Some(item) = stream.next().await {
        acc += item?;
    }
    Ok(acc)
}

/// Fold a chunk stream into a one-generation `ChatResult`.
pub async fn collect_into_result(stream: ChunkStream) -> Result<ChatResult, SdkError> {
    let chunk = collect_chunks(stream).await?;
    Ok(ChatResult {
        generations: vec![chunk.into()],
        llm_output: None,
    })
}
