//! Outbound chunk wire format.

use serde::{Deserialize, Serialize};

use crate::agent::{EventKind, ToolUse};
use crate::error::Result;

/// Tool results longer than this many characters are cut in traces.
pub const RESULT_PREVIEW_CHARS: usize = 200;

/// One unit of the outbound stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub trace: Option<String>,
}

impl Chunk {
    /// Display text, no trace.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            trace: None,
        }
    }

    /// Trace annotation with empty display text.
    pub fn trace(trace: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            trace: Some(trace.into()),
        }
    }

    /// Serialize as one NDJSON line.
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

pub fn stream_chunk(text: &str, trace: Option<&str>) -> Result<String> {
    Chunk {
        text: text.to_string(),
        trace: trace.map(str::to_string),
    }
    .to_line()
}

/// First [`RESULT_PREVIEW_CHARS`] characters plus `...` when longer.
pub fn truncate_result(text: &str) -> String {
    match text.char_indices().nth(RESULT_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn render_tool_use(tool_use: &ToolUse) -> String {
    format!("```\n{}: {}\n```\n", tool_use.name, tool_use.input)
}

pub fn render_tool_result(text: &str) -> String {
    format!("```\n{}\n```\n", truncate_result(text))
}

/// Chunks emitted for one classified event, in order.
pub fn chunks_for(kind: EventKind) -> Vec<Chunk> {
    match kind {
        EventKind::NotAMessage | EventKind::AssistantEmpty => Vec::new(),
        EventKind::AssistantText(text) => vec![Chunk::text(text)],
        EventKind::AssistantToolUse(tool_use) => vec![Chunk::trace(render_tool_use(&tool_use))],
        EventKind::AssistantTextAndToolUse(text, tool_use) => vec![
            Chunk::trace(format!("{text}\n")),
            Chunk::trace(render_tool_use(&tool_use)),
        ],
        EventKind::ToolResult(text) => vec![Chunk::trace(render_tool_result(&text))],
    }
}
