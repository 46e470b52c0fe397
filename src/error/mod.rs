//! Error types for the gateway.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Primary error type for all gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Provider process error: {provider}: {message}")]
    Process { provider: String, message: String },

    #[error("Tool invocation error: {tool_name}: {message}")]
    ToolInvocation { tool_name: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Agent construction error: {0}")]
    AgentConstruction(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Failed to clean up workspace {}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

/// Broad error category, one per failure class the gateway distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Fatal at startup.
    Config,
    /// One provider failed to start.
    Process,
    /// A tool call failed; surfaced to the agent as a failed tool result.
    ToolInvocation,
    /// Caller-supplied tool argument was rejected.
    Argument,
    /// The agent could not be built for this request.
    AgentConstruction,
    /// Failure while the agent was running.
    Streaming,
    /// Workspace removal failed; logged only.
    Cleanup,
    /// A remote service answered with an error or could not be reached.
    Upstream,
    Internal,
}

impl GatewayError {
    pub fn process(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Process {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn tool_invocation(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolInvocation {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Config,
            Self::Process { .. } => ErrorCategory::Process,
            Self::ToolInvocation { .. } => ErrorCategory::ToolInvocation,
            Self::InvalidArgument(_) => ErrorCategory::Argument,
            Self::AgentConstruction(_) => ErrorCategory::AgentConstruction,
            Self::Stream(_) | Self::Timeout(_) => ErrorCategory::Streaming,
            Self::Cleanup { .. } => ErrorCategory::Cleanup,
            Self::Api { .. } | Self::Network(_) => ErrorCategory::Upstream,
            Self::Io(_)
            | Self::Serialization(_)
            | Self::InvalidState(_)
            | Self::UnsupportedOperation(_) => ErrorCategory::Internal,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::Argument | ErrorCategory::AgentConstruction => StatusCode::BAD_REQUEST,
            ErrorCategory::Process | ErrorCategory::Upstream => StatusCode::BAD_GATEWAY,
            ErrorCategory::Streaming if matches!(self, Self::Timeout(_)) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_error_display_includes_provider() {
        let err = GatewayError::process("filesystem", "spawn failed");
        let msg = err.to_string();
        assert!(msg.contains("filesystem"), "expected provider in message: {msg}");
        assert!(msg.contains("spawn failed"), "expected cause in message: {msg}");
    }

    #[test]
    fn tool_and_argument_errors_have_distinct_categories() {
        assert_eq!(
            GatewayError::tool_invocation("echo", "boom").category(),
            ErrorCategory::ToolInvocation
        );
        assert_eq!(
            GatewayError::InvalidArgument("outside workspace".into()).category(),
            ErrorCategory::Argument
        );
    }

    #[test]
    fn cleanup_error_keeps_io_source() {
        let err = GatewayError::Cleanup {
            path: PathBuf::from("/tmp/ws/abc"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.category(), ErrorCategory::Cleanup);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("/tmp/ws/abc"));
    }

    #[test]
    fn process_failures_map_to_bad_gateway() {
        let response = GatewayError::process("git", "exited").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn timeout_maps_to_gateway_timeout() {
        let response = GatewayError::Timeout(1500).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
