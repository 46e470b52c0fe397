//! Tool system: the capabilities the agent can invoke.

pub mod arguments;
pub mod tool;
pub mod types;

use std::sync::Arc;

pub use arguments::ToolArguments;
pub use tool::{AgentTool, Tool, ToolExecutionContext};
pub use types::AgentToolParameters;

/// Shared handle to one invocable tool.
pub type ToolHandle = Arc<dyn Tool>;
