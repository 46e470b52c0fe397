//! Client for one tool-provider subprocess.

use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, Content, JsonObject, ProtocolVersion,
        ResourceContents,
    },
    service::{ClientInitializeError, ServiceError},
};
use tracing::{debug, warn};

use super::schema::MCPToolSchema;
use super::transport::{MCPRunningService, MCPTransport};
use crate::error::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MCPConnectionState {
    Disconnected,
    Initialized,
    Closed,
}

#[derive(Debug, Clone)]
pub struct MCPToolCallResult {
    pub structured_content: Option<serde_json::Value>,
    pub text_content: Option<String>,
    pub content: Vec<serde_json::Value>,
}

impl MCPToolCallResult {
    pub fn into_value_or_text(self) -> serde_json::Value {
        if let Some(structured) = self.structured_content {
            return structured;
        }
        if let Some(text) = self.text_content {
            return serde_json::Value::String(text);
        }
        serde_json::Value::Array(self.content)
    }
}

/// Supervises one provider process and its MCP session.
pub struct MCPClient {
    provider: String,
    transport: Option<Box<dyn MCPTransport>>,
    session: Option<MCPRunningService>,
    state: MCPConnectionState,
}

impl MCPClient {
    /// Create a client for `provider` that will connect through `transport`.
    pub fn new(provider: impl Into<String>, transport: Box<dyn MCPTransport>) -> Self {
        Self {
            provider: provider.into(),
            transport: Some(transport),
            session: None,
            state: MCPConnectionState::Disconnected,
        }
    }

    /// Launch the provider and complete the handshake.
    pub async fn start(&mut self) -> Result<(), GatewayError> {
        if let Some(session) = self.session.as_ref() {
            if !session.is_closed() {
                self.state = MCPConnectionState::Initialized;
                return Ok(());
            }
            self.session = None;
        }
        if self.state == MCPConnectionState::Closed {
            return Err(GatewayError::process(&self.provider, "client has been shut down"));
        }

        let session = self.connect_with_protocol_fallback().await?;
        self.session = Some(session);
        self.state = MCPConnectionState::Initialized;
        debug!(provider = %self.provider, "MCP provider initialized");
        Ok(())
    }

    /// List available tools from the provider.
    pub async fn list_tools(&mut self) -> Result<Vec<MCPToolSchema>, GatewayError> {
        self.ensure_initialized()?;

        let tools = match self.list_tools_from_active_session().await {
            Ok(tools) => tools,
            Err(error) if should_reconnect_after_service_error(&error) => {
                self.reconnect().await?;
                self.list_tools_from_active_session()
                    .await
                    .map_err(|retry_error| self.map_list_error(retry_error))?
            }
            Err(error) => return Err(self.map_list_error(error)),
        };

        Ok(tools.into_iter().map(map_mcp_tool_schema).collect())
    }

    /// Execute a tool on the provider.
    pub async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult, GatewayError> {
        self.ensure_initialized()
            .map_err(|e| GatewayError::tool_invocation(name, e.to_string()))?;
        let arguments = coerce_tool_arguments(arguments)?;

        let result = match self
            .call_tool_from_active_session(name, arguments.clone())
            .await
        {
            Ok(result) => result,
            Err(error) if should_reconnect_after_service_error(&error) => {
                warn!(provider = %self.provider, tool = name, "MCP session lost, reconnecting");
                self.reconnect()
                    .await
                    .map_err(|e| GatewayError::tool_invocation(name, e.to_string()))?;
                self.call_tool_from_active_session(name, arguments)
                    .await
                    .map_err(|retry_error| map_call_error(name, retry_error))?
            }
            Err(error) => return Err(map_call_error(name, error)),
        };

        map_call_result(name, result)
    }

    /// Cancel the session and reap the provider process.
    pub async fn shutdown(&mut self) -> Result<(), GatewayError> {
        self.state = MCPConnectionState::Closed;
        if let Some(transport) = self.transport.as_mut() {
            transport.close();
        }
        if let Some(session) = self.session.take() {
            session.cancel().await.map_err(|e| {
                GatewayError::process(&self.provider, format!("shutdown failed: {e}"))
            })?;
        }
        Ok(())
    }

    fn ensure_initialized(&self) -> Result<(), GatewayError> {
        match self.state {
            MCPConnectionState::Initialized => Ok(()),
            MCPConnectionState::Closed => {
                Err(GatewayError::process(&self.provider, "MCP session is closed"))
            }
            MCPConnectionState::Disconnected => Err(GatewayError::UnsupportedOperation(
                "MCP client must be started first".into(),
            )),
        }
    }

    async fn reconnect(&mut self) -> Result<(), GatewayError> {
        self.session = None;
        self.state = MCPConnectionState::Disconnected;
        self.start().await
    }

    async fn connect_with_protocol_fallback(&mut self) -> Result<MCPRunningService, GatewayError> {
        let provider = self.provider.clone();
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| GatewayError::process(&provider, "missing MCP transport"))?;

        let latest_client_info = rmcp::model::ClientInfo {
            protocol_version: ProtocolVersion::LATEST,
            ..Default::default()
        };

        match transport.connect(latest_client_info).await {
            Ok(session) => return Ok(session),
            Err(error) if should_retry_protocol_fallback(&error) => {
                debug!(provider = %provider, "retrying MCP initialize with 2024-11-05 protocol");
            }
            Err(error) => return Err(map_client_initialize_error(&provider, error)),
        }

        let fallback_client_info = rmcp::model::ClientInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            ..Default::default()
        };
        transport
            .connect(fallback_client_info)
            .await
            .map_err(|error| map_client_initialize_error(&provider, error))
    }

    async fn list_tools_from_active_session(
        &mut self,
    ) -> Result<Vec<rmcp::model::Tool>, ServiceError> {
        let session = self.session.as_mut().ok_or(ServiceError::TransportClosed)?;

        match session.list_all_tools().await {
            Ok(tools) => Ok(tools),
            Err(ServiceError::UnexpectedResponse) => {
                session.list_tools(None).await.map(|page| page.tools)
            }
            Err(error) => Err(error),
        }
    }

    async fn call_tool_from_active_session(
        &mut self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ServiceError> {
        let session = self.session.as_mut().ok_or(ServiceError::TransportClosed)?;

        session
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_owned().into(),
                arguments,
                task: None,
            })
            .await
    }

    fn map_list_error(&self, error: ServiceError) -> GatewayError {
        match error {
            ServiceError::Timeout { timeout } => GatewayError::Timeout(timeout.as_millis() as u64),
            other => GatewayError::process(&self.provider, describe_service_error("list_tools", &other)),
        }
    }
}

fn should_reconnect_after_service_error(error: &ServiceError) -> bool {
    matches!(
        error,
        ServiceError::TransportClosed | ServiceError::TransportSend(_)
    )
}

fn should_retry_protocol_fallback(error: &ClientInitializeError) -> bool {
    match error {
        ClientInitializeError::JsonRpcError(error) => {
            let message = error.message.to_ascii_lowercase();
            message.contains("protocol") && message.contains("version")
        }
        _ => false,
    }
}

fn map_mcp_tool_schema(tool: rmcp::model::Tool) -> MCPToolSchema {
    MCPToolSchema {
        name: tool.name.to_string(),
        description: tool.description.map(|d| d.to_string()),
        input_schema: serde_json::Value::Object((*tool.input_schema).clone()),
    }
}

fn coerce_tool_arguments(value: serde_json::Value) -> Result<Option<JsonObject>, GatewayError> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(map) => Ok(Some(map)),
        serde_json::Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            let parsed: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| {
                GatewayError::InvalidArgument(format!("MCP tool arguments must be valid JSON: {e}"))
            })?;
            coerce_tool_arguments(parsed)
        }
        other => Err(GatewayError::InvalidArgument(format!(
            "MCP tool arguments must be a JSON object; got {other}"
        ))),
    }
}

fn extract_text_content(content: &[Content]) -> Option<String> {
    let mut lines = Vec::new();
    for item in content {
        if let Some(text) = item.as_text() {
            lines.push(text.text.clone());
            continue;
        }
        if let Some(resource) = item.as_resource() {
            if let ResourceContents::TextResourceContents { text, .. } = &resource.resource {
                lines.push(text.clone());
            }
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn map_call_result(name: &str, result: CallToolResult) -> Result<MCPToolCallResult, GatewayError> {
    let text_content = extract_text_content(&result.content);
    let content = result
        .content
        .iter()
        .filter_map(|item| serde_json::to_value(item).ok())
        .collect::<Vec<_>>();

    if result.is_error.unwrap_or(false) {
        let message = result
            .structured_content
            .as_ref()
            .map(|v| v.to_string())
            .or_else(|| text_content.clone())
            .unwrap_or_else(|| "MCP tool returned an error result".into());

        return Err(GatewayError::tool_invocation(name, message));
    }

    Ok(MCPToolCallResult {
        structured_content: result.structured_content,
        text_content,
        content,
    })
}

fn map_client_initialize_error(provider: &str, error: ClientInitializeError) -> GatewayError {
    let message = match error {
        ClientInitializeError::ConnectionClosed(context) => {
            format!("MCP initialize connection closed: {context}")
        }
        ClientInitializeError::TransportError { error, context } => {
            format!("MCP initialize transport error ({context}): {error}")
        }
        ClientInitializeError::JsonRpcError(error) => format!(
            "MCP initialize JSON-RPC error {}: {}",
            error.code.0, error.message
        ),
        ClientInitializeError::Cancelled => "MCP initialize cancelled".to_string(),
        other => format!("MCP initialize error: {other}"),
    };
    GatewayError::process(provider, message)
}

fn map_call_error(name: &str, error: ServiceError) -> GatewayError {
    match error {
        ServiceError::Timeout { timeout } => GatewayError::Timeout(timeout.as_millis() as u64),
        other => GatewayError::tool_invocation(name, describe_service_error("call_tool", &other)),
    }
}

fn describe_service_error(context: &str, error: &ServiceError) -> String {
    match error {
        ServiceError::McpError(error) => {
            format!("{context}: MCP error {}: {}", error.code.0, error.message)
        }
        ServiceError::TransportSend(error) => {
            format!("{context}: MCP transport send failed: {error}")
        }
        ServiceError::TransportClosed => format!("{context}: MCP transport closed"),
        ServiceError::UnexpectedResponse => format!("{context}: unexpected MCP response"),
        ServiceError::Cancelled { reason } => {
            let suffix = reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default();
            format!("{context}: MCP request cancelled{suffix}")
        }
        other => format!("{context}: MCP service error: {other}"),
    }
}
