//! Result objects returned by chat models.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::sdk_types::usage::UsageMetadata;

/// Free-form metadata attached to messages and results.
pub type Metadata = serde_json::Map<String, JsonValue>;

/// A complete model turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiMessage {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub response_metadata: Metadata,
}

impl AiMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// One candidate produced by a `generate` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatGeneration {
    pub message: AiMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_info: Option<Metadata>,
}

impl ChatGeneration {
    pub fn new(message: AiMessage) -> Self {
        Self {
            message,
            generation_info: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.message.content
    }
}

/// Everything a `generate` call returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResult {
    pub generations: Vec<ChatGeneration>,
    /// Provider-level output such as aggregate token usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_output: Option<Metadata>,
}

/// An incremental piece of a model turn.
///
/// Chunks concatenate with `+`: content is appended, usage is summed and
/// response metadata is merged with later keys winning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiMessageChunk {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub response_metadata: Metadata,
}

impl AiMessageChunk {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

impl AddAssign for AiMessageChunk {
    fn add_assign(&mut self, rhs: Self) {
        self.content.push_str(&rhs.content);
        self.usage_metadata = match (self.usage_metadata.take(), rhs.usage_metadata) {
            (Some(a), Some(b)) => Some(a + b),
            (a, b) => a.or(b),
        };
        merge_metadata(&mut self.response_metadata, rhs.response_metadata);
    }
}

impl Add for AiMessageChunk {
    type Output = AiMessageChunk;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl From<AiMessageChunk> for AiMessage {
    fn from(chunk: AiMessageChunk) -> Self {
        AiMessage {
            content: chunk.content,
            usage_metadata: chunk.usage_metadata,
            response_metadata: chunk.response_metadata,
        }
    }
}

/// A streamed generation fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatGenerationChunk {
    pub message: AiMessageChunk,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_info: Option<Metadata>,
}

impl ChatGenerationChunk {
    pub fn new(message: AiMessageChunk) -> Self {
        Self {
            message,
            generation_info: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.message.content
    }

    /// True when the chunk carries no text, only usage or response metadata.
    pub fn is_metadata_only(&self) -> bool {
        self.message.content.is_empty()
            && (self.message.usage_metadata.is_some() || !self.message.response_metadata.is_empty())
    }
}

impl AddAssign for ChatGenerationChunk {
    fn add_assign(&mut self, rhs: Self) {
        self.message += rhs.message;
        if let Some(info) = rhs.generation_info {
            merge_metadata(self.generation_info.get_or_insert_with(Metadata::new), info);
        }
    }
}

impl Add for ChatGenerationChunk {
    type Output = ChatGenerationChunk;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl From<ChatGenerationChunk> for ChatGeneration {
    fn from(chunk: ChatGenerationChunk) -> Self {
        ChatGeneration {
            message: chunk.message.into(),
            generation_info: chunk.generation_info,
        }
    }
}

impl From<ChatGeneration> for ChatGenerationChunk {
    fn from(generation: ChatGeneration) -> Self {
        let AiMessage {
            content,
            usage_metadata,
            response_metadata,
        } = generation.message;
        ChatGenerationChunk {
            message: AiMessageChunk {
                content,
                usage_metadata,
                response_metadata,
            },
            generation_info: generation.generation_info,
        }
    }
}

fn merge_metadata(into: &mut Metadata, from: Metadata) {
    for (k, v) in from {
        into.insert(k, v);
    }
}
