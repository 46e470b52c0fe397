//! Agent engine boundary.

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use super::events::AgentEvent;
use super::message::EngineMessage;
use crate::error::Result;
use crate::tools::ToolHandle;

/// Which model to run and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSelection {
    pub model_id: String,
    pub region: String,
}

/// Everything needed to build one agent execution.
pub struct AgentSpec {
    pub system_prompt: String,
    pub messages: Vec<EngineMessage>,
    pub model: ModelSelection,
    pub tools: Vec<ToolHandle>,
    /// Threaded into every tool call's execution context.
    pub session_id: String,
}

/// Builds executions; one per request.
pub trait AgentEngine: Send + Sync {
    /// Validate `spec` and prepare an execution. Fails with `AgentConstruction`.
    fn create(&self, spec: AgentSpec) -> Result<Box<dyn AgentExecution>>;
}

/// A single-use, lazily driven agent run.
pub trait AgentExecution: Send {
    /// Run the agent on `prompt`. Nothing happens until the stream is polled;
    /// dropping the stream abandons the run.
    fn stream(self: Box<Self>, prompt: String) -> BoxStream<'static, Result<AgentEvent>>;
}
