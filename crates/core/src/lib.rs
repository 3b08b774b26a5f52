//! Host chat-model interface and the plumbing shared by its implementations.

pub mod chat_model;
pub mod error;
pub mod retry;
pub mod stream_collect;
pub mod transport;

pub use crate::core::chat_model::{ChatModel, ChunkStream};
pub use crate::core::error::{SdkError, TransportError};
pub use crate::core::stream_collect::{collect_chunks, collect_into_result};

#[cfg(test)]
#[path = "../tests/error_tests.rs"]
mod error_tests;

#[cfg(test)]
#[path = "../tests/retry_tests.rs"]
mod retry_tests;

#[cfg(test)]
#[path = "../tests/chat_model_tests.rs"]
mod chat_model_tests;

#[cfg(test)]
#[path = "../tests/transport_tests.rs"]
mod transport_tests;
