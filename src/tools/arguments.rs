//! Typed access to tool call arguments.

use crate::error::GatewayError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, GatewayError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| GatewayError::InvalidArgument(format!("Missing string argument: {key}")))
    }
}
