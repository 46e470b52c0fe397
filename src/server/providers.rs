use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::state::AppState;
use crate::error::GatewayError;
use crate::mcp::ProviderSpec;

/// Body of `POST /mcp-server`.
#[derive(Debug, Clone, Deserialize)]
pub struct McpServerAddRequest {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl From<McpServerAddRequest> for ProviderSpec {
    fn from(request: McpServerAddRequest) -> Self {
        Self {
            name: request.name,
            command: request.command,
            args: request.args,
            env: request.env,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerAddResponse {
    pub message: String,
    pub loaded: usize,
}

/// POST /mcp-server - start one more provider and publish its tools.
pub async fn handler(
    State(state): State<AppState>,
    Json(request): Json<McpServerAddRequest>,
) -> Result<(StatusCode, Json<McpServerAddResponse>), GatewayError> {
    let spec = ProviderSpec::from(request);
    spec.validate()
        .map_err(|e| GatewayError::InvalidArgument(e.to_string()))?;

    let loaded = state.registry.add_provider(spec).await?.len();
    Ok((
        StatusCode::CREATED,
        Json(McpServerAddResponse {
            message: format!("Successfully loaded {loaded} MCP tools"),
            loaded,
        }),
    ))
}
