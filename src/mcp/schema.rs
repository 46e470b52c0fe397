//! MCP schema types.

use serde::{Deserialize, Serialize};

use crate::tools::AgentToolParameters;

/// Schema for a tool exposed by an MCP server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MCPToolSchema {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: serde_json::Value,
}

impl MCPToolSchema {
    /// Input schema as tool parameters handed to the model.
    pub fn parameters(&self) -> AgentToolParameters {
        AgentToolParameters::from_schema(self.input_schema.clone())
    }
}
