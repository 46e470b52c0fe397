//! Event classifier: raw agent events to a closed set of renderable kinds.
//!
//! Every function here is pure and total. Events that do not look like
//! messages, or messages with unexpected shapes, degrade to the closest
//! harmless kind instead of failing.

use serde_json::Value;

use super::events::AgentEvent;
use super::message::ROLE_ASSISTANT;

/// A tool invocation requested by the assistant.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolUse {
    pub name: String,
    pub input: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    NotAMessage,
    AssistantText(String),
    AssistantToolUse(ToolUse),
    AssistantTextAndToolUse(String, ToolUse),
    /// Assistant message with neither text nor tool use.
    AssistantEmpty,
    ToolResult(String),
}

pub fn classify(event: &AgentEvent) -> EventKind {
    let Some(message) = message_of(event) else {
        return EventKind::NotAMessage;
    };
    if !is_assistant(message) {
        return EventKind::ToolResult(extract_tool_result(message));
    }

    match (extract_text(message), extract_tool_use(message)) {
        (Some(text), Some(tool_use)) => EventKind::AssistantTextAndToolUse(text, tool_use),
        (Some(text), None) => EventKind::AssistantText(text),
        (None, Some(tool_use)) => EventKind::AssistantToolUse(tool_use),
        (None, None) => EventKind::AssistantEmpty,
    }
}

/// The `message` payload, if this event carries one.
pub fn message_of(event: &AgentEvent) -> Option<&Value> {
    event.payload().get("message")
}

pub fn is_assistant(message: &Value) -> bool {
    message.get("role").and_then(Value::as_str) == Some(ROLE_ASSISTANT)
}

fn content_blocks(message: &Value) -> &[Value] {
    message
        .get("content")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// First text block, in emission order.
pub fn extract_text(message: &Value) -> Option<String> {
    content_blocks(message)
        .iter()
        .find_map(|block| block.get("text").and_then(Value::as_str))
        .map(str::to_string)
}

/// First tool-use block, in emission order.
pub fn extract_tool_use(message: &Value) -> Option<ToolUse> {
    content_blocks(message).iter().find_map(|block| {
        let tool_use = block.get("toolUse")?;
        Some(ToolUse {
            name: tool_use.get("name")?.as_str()?.to_string(),
            input: tool_use.get("input").cloned().unwrap_or(Value::Null),
        })
    })
}

/// Every text fragment of every tool-result block, concatenated.
pub fn extract_tool_result(message: &Value) -> String {
    content_blocks(message)
        .iter()
        .filter_map(|block| block.get("toolResult"))
        .flat_map(|result| content_blocks(result).iter())
        .filter_map(|item| item.get("text").and_then(Value::as_str))
        .collect()
}
