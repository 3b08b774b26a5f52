//! Adapter exposing an OpenAI-compatible chat-completions vendor through the
//! host `ChatModel` interface.
//!
//! Each call converts host messages to vendor request messages, calls the
//! vendor client, and repackages the response (or stream) as host results
//! with token usage and timing metadata attached.

pub mod chat_model;
pub mod convert;
pub mod options;

pub use chat_model::ChatCompletionsAdapter;
pub use convert::{
    build_chat_result, chunk_from_delta, convert_message, convert_messages, metadata_chunk,
};
pub use options::ChatCompletionsOptions;

#[cfg(test)]
#[path = "../tests/convert_tests.rs"]
mod convert_tests;

#[cfg(test)]
#[path = "../tests/options_tests.rs"]
mod options_tests;

#[cfg(test)]
#[path = "../tests/chat_model_tests.rs"]
mod chat_model_tests;
