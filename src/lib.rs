#[path = "../crates/sdk-types/src/lib.rs"]
pub mod types;
#[path = "../crates/core/src/lib.rs"]
pub mod core;
#[path = "../crates/streaming-sse/src/lib.rs"]
pub mod streaming_sse;
#[path = "../crates/transports/reqwest/src/lib.rs"]
pub mod transport_reqwest;

#[path = "../crates/providers/openai-compatible/src/lib.rs"]
pub mod provider_openai_compatible;
#[path = "../crates/chat-adapter/src/lib.rs"]
pub mod chat_adapter;

pub mod transports {
    pub use crate::transport_reqwest as reqwest;
}

pub mod providers {
    pub use crate::provider_openai_compatible as openai_compatible;
}

pub use crate::chat_adapter::{ChatCompletionsAdapter, ChatCompletionsOptions};
pub use crate::core::{ChatModel, ChunkStream, SdkError};
pub use crate::types::{
    AiMessage, AiMessageChunk, ChatGeneration, ChatGenerationChunk, ChatResult, Message,
    UsageMetadata,
};

pub(crate) use crate::core as adapter_core;
pub(crate) use crate::provider_openai_compatible as vendor;
pub(crate) use crate::streaming_sse as sse;
pub(crate) use crate::transport_reqwest as reqwest_transport;
pub(crate) use crate::types as sdk_types;
