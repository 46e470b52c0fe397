//! Tool aggregation across provider processes.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::client::{MCPClient, MCPToolCallResult};
use super::manifest::ProviderSpec;
use super::schema::MCPToolSchema;
use super::transport::StdioTransport;
use crate::error::{GatewayError, Result};
use crate::tools::{AgentToolParameters, Tool, ToolArguments, ToolExecutionContext, ToolHandle};

/// Operations the registry needs from one provider connection.
#[async_trait]
pub trait ProviderConnection: Send {
    async fn start(&mut self) -> Result<()>;
    async fn list_tools(&mut self) -> Result<Vec<MCPToolSchema>>;
    async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult>;
    async fn shutdown(&mut self) -> Result<()>;
}

#[async_trait]
impl ProviderConnection for MCPClient {
    async fn start(&mut self) -> Result<()> {
        MCPClient::start(self).await
    }

    async fn list_tools(&mut self) -> Result<Vec<MCPToolSchema>> {
        MCPClient::list_tools(self).await
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult> {
        MCPClient::call_tool(self, name, arguments).await
    }

    async fn shutdown(&mut self) -> Result<()> {
        MCPClient::shutdown(self).await
    }
}

/// Builds an unstarted connection for a manifest entry.
pub trait ProviderLauncher: Send + Sync {
    fn launch(&self, spec: &ProviderSpec) -> Box<dyn ProviderConnection>;
}

/// Launches providers as stdio subprocesses.
pub struct StdioLauncher {
    baseline_env: BTreeMap<String, String>,
}

impl StdioLauncher {
    pub fn new(baseline_env: BTreeMap<String, String>) -> Self {
        Self { baseline_env }
    }
}

impl ProviderLauncher for StdioLauncher {
    fn launch(&self, spec: &ProviderSpec) -> Box<dyn ProviderConnection> {
        let transport = StdioTransport::from_spec(spec, &self.baseline_env);
        Box::new(MCPClient::new(spec.name.clone(), Box::new(transport)))
    }
}

/// What startup does when a provider fails to start or list its tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::EnumString, strum::Display)]
pub enum ProviderFailurePolicy {
    /// Skip the failing provider and keep every healthy one.
    #[default]
    #[strum(serialize = "isolate")]
    IsolateProvider,
    /// Any failure empties the whole registry.
    #[strum(serialize = "discard-all")]
    DiscardAll,
}

/// One started provider; owns its connection.
pub struct Provider {
    name: String,
    connection: Mutex<Box<dyn ProviderConnection>>,
}

impl Provider {
    /// Start `connection` and wrap each advertised tool in a handle routed back here.
    pub async fn launch(
        name: impl Into<String>,
        mut connection: Box<dyn ProviderConnection>,
    ) -> Result<(Arc<Self>, Vec<ToolHandle>)> {
        let name = name.into();
        connection.start().await?;
        let schemas = match connection.list_tools().await {
            Ok(schemas) => schemas,
            Err(e) => {
                if let Err(shutdown_error) = connection.shutdown().await {
                    warn!(provider = %name, error = %shutdown_error, "failed to stop provider");
                }
                return Err(e);
            }
        };

        let provider = Arc::new(Self {
            name,
            connection: Mutex::new(connection),
        });
        let tools = schemas
            .into_iter()
            .map(|schema| Arc::new(ProviderTool::new(Arc::clone(&provider), schema)) as ToolHandle)
            .collect();
        Ok((provider, tools))
    }

    async fn call(&self, tool: &str, arguments: serde_json::Value) -> Result<serde_json::Value> {
        let result = self
            .connection
            .lock()
            .await
            .call_tool(tool, arguments)
            .await?;
        Ok(result.into_value_or_text())
    }

    async fn shutdown(&self) {
        if let Err(e) = self.connection.lock().await.shutdown().await {
            warn!(provider = %self.name, error = %e, "failed to stop provider");
        }
    }
}

/// One advertised tool; calls go back to the provider that listed it.
struct ProviderTool {
    provider: Arc<Provider>,
    name: String,
    description: String,
    parameters: AgentToolParameters,
}

impl ProviderTool {
    fn new(provider: Arc<Provider>, schema: MCPToolSchema) -> Self {
        Self {
            parameters: schema.parameters(),
            description: schema.description.unwrap_or_default(),
            name: schema.name,
            provider,
        }
    }
}

#[async_trait]
impl Tool for ProviderTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value> {
        self.provider.call(&self.name, args.raw().clone()).await
    }
}

/// Aggregate tool set shared by every session.
///
/// Reads take an `Arc` snapshot; appends build a new vector and swap it in
/// under the write lock, so a reader never sees a half-appended list.
pub struct ToolRegistry {
    tools: RwLock<Arc<Vec<ToolHandle>>>,
    providers: Mutex<Vec<Arc<Provider>>>,
    launcher: Arc<dyn ProviderLauncher>,
}

impl ToolRegistry {
    pub fn empty(launcher: Arc<dyn ProviderLauncher>) -> Self {
        Self {
            tools: RwLock::new(Arc::new(Vec::new())),
            providers: Mutex::new(Vec::new()),
            launcher,
        }
    }

    /// Start every provider in manifest order and concatenate their tools.
    pub async fn build(
        specs: &[ProviderSpec],
        launcher: Arc<dyn ProviderLauncher>,
        policy: ProviderFailurePolicy,
    ) -> Self {
        let mut providers = Vec::with_capacity(specs.len());
        let mut tools: Vec<ToolHandle> = Vec::new();

        for spec in specs {
            match Provider::launch(spec.name.clone(), launcher.launch(spec)).await {
                Ok((provider, provided)) => {
                    info!(provider = %spec.name, count = provided.len(), "loaded provider tools");
                    warn_duplicate_names(&tools, &provided);
                    tools.extend(provided);
                    providers.push(provider);
                }
                Err(e) => match policy {
                    ProviderFailurePolicy::IsolateProvider => {
                        warn!(provider = %spec.name, error = %e, "skipping provider that failed to start");
                    }
                    ProviderFailurePolicy::DiscardAll => {
                        error!(provider = %spec.name, error = %e, "provider failed; discarding all tools");
                        for provider in &providers {
                            provider.shutdown().await;
                        }
                        return Self::empty(launcher);
                    }
                },
            }
        }

        info!(count = tools.len(), providers = providers.len(), "tool registry ready");
        Self {
            tools: RwLock::new(Arc::new(tools)),
            providers: Mutex::new(providers),
            launcher,
        }
    }

    /// Current tool set; unaffected by later appends.
    pub fn snapshot(&self) -> Arc<Vec<ToolHandle>> {
        Arc::clone(&self.tools.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Start one more provider and append its tools to the live registry.
    pub async fn add_provider(&self, spec: ProviderSpec) -> Result<Vec<ToolHandle>> {
        spec.validate()?;
        let (provider, added) = Provider::launch(spec.name.clone(), self.launcher.launch(&spec))
            .await
            .map_err(|e| match e {
                GatewayError::Process { .. } => e,
                other => GatewayError::process(&spec.name, other.to_string()),
            })?;

        {
            let mut guard = self.tools.write().unwrap_or_else(PoisonError::into_inner);
            warn_duplicate_names(&guard, &added);
            let mut next = Vec::with_capacity(guard.len() + added.len());
            next.extend(guard.iter().cloned());
            next.extend(added.iter().cloned());
            *guard = Arc::new(next);
        }
        self.providers.lock().await.push(provider);

        info!(provider = %spec.name, count = added.len(), "registered provider at runtime");
        Ok(added)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.snapshot()
            .iter()
            .map(|tool| tool.name().to_string())
            .collect()
    }

    /// Stop every provider process. Tools already handed out fail afterwards.
    pub async fn shutdown(&self) {
        let providers = std::mem::take(&mut *self.providers.lock().await);
        for provider in providers {
            provider.shutdown().await;
        }
    }
}

fn warn_duplicate_names(existing: &[ToolHandle], added: &[ToolHandle]) {
    let mut seen: HashSet<&str> = existing.iter().map(|tool| tool.name()).collect();
    for tool in added {
        if !seen.insert(tool.name()) {
            warn!(tool = tool.name(), "duplicate tool name across providers");
        }
    }
}
