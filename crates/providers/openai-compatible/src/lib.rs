//! Client for OpenAI-compatible chat-completions endpoints.
//!
//! This is the vendor side of the adapter: typed request/response shapes,
//! a client with blocking-style `create` and streaming `create_stream`, and
//! the mapping from HTTP failures to `SdkError`.

pub mod api_types;
pub mod client;
pub mod config;
pub mod error;
mod stream;

pub use api_types::{
    Choice, ChunkChoice, CompletionChunk, CompletionRequest, CompletionResponse, Delta,
    RequestMessage, ResponseMessage, StreamOptions, Usage,
};
pub use client::ChatCompletionsClient;
pub use config::ClientConfig;
pub use stream::{decode_completion_stream, CompletionStream};

#[cfg(test)]
#[path = "../tests/test_transport.rs"]
pub(crate) mod test_transport;

#[cfg(test)]
#[path = "../tests/api_types_tests.rs"]
mod api_types_tests;

#[cfg(test)]
#[path = "../tests/config_tests.rs"]
mod config_tests;

#[cfg(test)]
#[path = "../tests/client_tests.rs"]
mod client_tests;

#[cfg(test)]
#[path = "../tests/stream_tests.rs"]
mod stream_tests;
