//! Agent engine boundary, event classification and the Bedrock engine.

pub mod bedrock;
pub mod classify;
pub mod engine;
pub mod events;
pub mod message;

pub use bedrock::BedrockAgentEngine;
pub use classify::{classify, EventKind, ToolUse};
pub use engine::{AgentEngine, AgentExecution, AgentSpec, ModelSelection};
pub use events::AgentEvent;
pub use message::{
    convert_messages, ContentBlock, EngineMessage, InboundMessage, ToolResultBlock,
    ToolResultContent, ToolResultStatus, ToolUseBlock,
};
