use serde::{Deserialize, Serialize};

use crate::sdk_types::outputs::AiMessage;

/// A message in a chat prompt.
///
/// The set of kinds is fixed by the host interface. Adapters decide which of
/// them their vendor can accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// Instructions that prime the model.
    System { content: String },
    /// Input from the end user.
    Human { content: String },
    /// A previous model turn.
    Ai(AiMessage),
    /// A message with a caller-chosen role string.
    Chat { role: String, content: String },
    /// The result of a tool invocation.
    Tool {
        content: String,
        tool_call_id: String,
    },
    /// Legacy function-call result.
    Function { content: String, name: String },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Message::Human {
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Message::Ai(AiMessage::new(content))
    }

    pub fn chat(role: impl Into<String>, content: impl Into<String>) -> Self {
        Message::Chat {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Message::Tool {
            content: content.into(),
            tool_call_id: tool_call_id.into(),
        }
    }

    /// Short name of the message kind, used in errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::System { .. } => "system",
            Message::Human { .. } => "human",
            Message::Ai(_) => "ai",
            Message::Chat { .. } => "chat",
            Message::Tool { .. } => "tool",
            Message::Function { .. } => "function",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::System { content }
            | Message::Human { content }
            | Message::Chat { content, .. }
            | Message::Tool { content, .. }
            | Message::Function { content, .. } => content,
            Message::Ai(ai) => &ai.content,
        }
    }
}

impl From<AiMessage> for Message {
    fn from(message: AiMessage) -> Self {
        Message::Ai(message)
    }
}
