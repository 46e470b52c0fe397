//! Engine message shapes (Converse content blocks).

use serde::{Deserialize, Serialize};

pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";

/// One message in the engine's conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineMessage {
    pub role: String,
    pub content: Vec<ContentBlock>,
}

impl EngineMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: ROLE_USER.to_string(),
            content: vec![ContentBlock::Text(text.into())],
        }
    }

    pub fn tool_results(results: Vec<ToolResultBlock>) -> Self {
        Self {
            role: ROLE_USER.to_string(),
            content: results.into_iter().map(ContentBlock::ToolResult).collect(),
        }
    }

    /// Tool-use blocks in emission order.
    pub fn tool_uses(&self) -> impl Iterator<Item = &ToolUseBlock> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::ToolUse(tool_use) => Some(tool_use),
            _ => None,
        })
    }
}

/// A content block, serialized as `{"text": ..}`, `{"toolUse": ..}` or `{"toolResult": ..}`.
///
/// Block kinds the gateway does not interpret are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentBlock {
    Text(String),
    ToolUse(ToolUseBlock),
    ToolResult(ToolResultBlock),
    #[serde(untagged)]
    Other(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUseBlock {
    pub tool_use_id: String,
    pub name: String,
    pub input: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolResultStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultBlock {
    pub tool_use_id: String,
    pub status: ToolResultStatus,
    pub content: Vec<ToolResultContent>,
}

impl ToolResultBlock {
    /// Successful result; objects travel as JSON, everything else as text.
    pub fn success(tool_use_id: impl Into<String>, value: serde_json::Value) -> Self {
        let content = match value {
            serde_json::Value::String(text) => ToolResultContent::Text(text),
            value @ serde_json::Value::Object(_) => ToolResultContent::Json(value),
            other => ToolResultContent::Text(other.to_string()),
        };
        Self {
            tool_use_id: tool_use_id.into(),
            status: ToolResultStatus::Success,
            content: vec![content],
        }
    }

    pub fn error(tool_use_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            status: ToolResultStatus::Error,
            content: vec![ToolResultContent::Text(message.into())],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolResultContent {
    Text(String),
    Json(serde_json::Value),
}

/// Prior-turn message as sent by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub role: String,
    pub content: String,
}

/// Each inbound message becomes one engine message with a single text block.
pub fn convert_messages(messages: &[InboundMessage]) -> Vec<EngineMessage> {
    messages
        .iter()
        .map(|m| EngineMessage {
            role: m.role.clone(),
            content: vec![ContentBlock::Text(m.content.clone())],
        })
        .collect()
}
