//! Host-side types for chat models.
//!
//! These are the message, result and usage shapes a chat model exchanges with
//! its caller. They are vendor-agnostic; adapters translate them to and from a
//! vendor's wire format.

pub mod messages;
pub mod outputs;
pub mod usage;

pub use messages::Message;
pub use outputs::{
    AiMessage, AiMessageChunk, ChatGeneration, ChatGenerationChunk, ChatResult, Metadata,
};
pub use usage::UsageMetadata;

#[cfg(test)]
#[path = "../tests/messages_tests.rs"]
mod messages_tests;

#[cfg(test)]
#[path = "../tests/outputs_tests.rs"]
mod outputs_tests;

#[cfg(test)]
#[path = "../tests/usage_tests.rs"]
mod usage_tests;
