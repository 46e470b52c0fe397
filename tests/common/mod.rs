//! Shared test helpers: scripted agent engine, recording blob store and
//! in-process tool providers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::json;

use mcp_gateway::agent::{AgentEngine, AgentEvent, AgentExecution, AgentSpec};
use mcp_gateway::artifact::BlobStore;
use mcp_gateway::aws::AwsCredentials;
use mcp_gateway::config::{GatewayConfig, UPLOAD_TOOL_NAME};
use mcp_gateway::error::{GatewayError, Result};
use mcp_gateway::mcp::{
    MCPToolCallResult, MCPToolSchema, ProviderConnection, ProviderLauncher, ProviderSpec,
};
use mcp_gateway::mcp::ToolRegistry;
use mcp_gateway::session::{SessionDriver, StreamingRequest};
use mcp_gateway::tools::{ToolArguments, ToolExecutionContext, ToolHandle};

pub fn test_config(workspace_root: &Path) -> Arc<GatewayConfig> {
    Arc::new(
        GatewayConfig::builder()
            .workspace_root(workspace_root)
            .file_bucket("artifacts")
            .aws_region("us-east-1")
            .credentials(AwsCredentials::new("AKIDEXAMPLE", "secret", None))
            .build(),
    )
}

pub fn request(user_prompt: &str) -> StreamingRequest {
    serde_json::from_value(json!({
        "systemPrompt": "You are helpful.",
        "userPrompt": user_prompt,
        "messages": [],
        "model": { "modelId": "test-model", "region": "us-east-1" }
    }))
    .expect("request fixture should deserialize")
}

pub fn assistant_text(text: &str) -> serde_json::Value {
    json!({ "message": { "role": "assistant", "content": [{ "text": text }] } })
}

/// One step of a scripted agent run.
#[derive(Debug, Clone)]
pub enum Step {
    Event(serde_json::Value),
    Fail(String),
    Pause(Duration),
    /// Write `name` into the session workspace, then call the upload tool on it.
    UploadFile(String),
    /// Call a registry tool and emit its result as a tool-result message.
    CallTool(String, serde_json::Value),
}

/// What the engine saw when an execution was created.
#[derive(Debug, Clone)]
pub struct SeenSpec {
    pub session_id: String,
    pub system_prompt: String,
    pub tool_names: Vec<String>,
    pub message_count: usize,
}

pub struct ScriptedEngine {
    steps: Vec<Step>,
    fail_create: Option<String>,
    workspace_root: PathBuf,
    pub seen: Arc<Mutex<Vec<SeenSpec>>>,
    pub uploads: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedEngine {
    pub fn new(workspace_root: &Path, steps: Vec<Step>) -> Self {
        Self {
            steps,
            fail_create: None,
            workspace_root: workspace_root.to_path_buf(),
            seen: Arc::new(Mutex::new(Vec::new())),
            uploads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing_create(workspace_root: &Path, message: &str) -> Self {
        let mut engine = Self::new(workspace_root, Vec::new());
        engine.fail_create = Some(message.to_string());
        engine
    }
}

impl AgentEngine for ScriptedEngine {
    fn create(&self, spec: AgentSpec) -> Result<Box<dyn AgentExecution>> {
        self.seen.lock().unwrap().push(SeenSpec {
            session_id: spec.session_id.clone(),
            system_prompt: spec.system_prompt.clone(),
            tool_names: spec.tools.iter().map(|t| t.name().to_string()).collect(),
            message_count: spec.messages.len(),
        });
        if let Some(message) = &self.fail_create {
            return Err(GatewayError::AgentConstruction(message.clone()));
        }
        Ok(Box::new(ScriptedExecution {
            steps: self.steps.clone(),
            workspace: self.workspace_root.join(&spec.session_id),
            session_id: spec.session_id,
            tools: spec.tools,
            uploads: Arc::clone(&self.uploads),
        }))
    }
}

struct ScriptedExecution {
    steps: Vec<Step>,
    workspace: PathBuf,
    session_id: String,
    tools: Vec<ToolHandle>,
    uploads: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedExecution {
    async fn call(&self, name: &str, input: serde_json::Value) -> Result<serde_json::Value> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| GatewayError::tool_invocation(name, "not offered"))?;
        tool.execute(
            &ToolArguments::new(input),
            &ToolExecutionContext::for_session(&self.session_id),
        )
        .await
    }
}

fn tool_result_event(text: &str) -> AgentEvent {
    AgentEvent::new(json!({ "message": { "role": "user", "content": [{
        "toolResult": { "toolUseId": "t1", "status": "success", "content": [{ "text": text }] }
    }] } }))
}

impl AgentExecution for ScriptedExecution {
    fn stream(self: Box<Self>, _prompt: String) -> BoxStream<'static, Result<AgentEvent>> {
        Box::pin(async_stream::stream! {
            yield Ok(AgentEvent::init_event_loop());
            for step in self.steps.clone() {
                match step {
                    Step::Event(value) => {
                        yield Ok(AgentEvent::new(value));
                    }
                    Step::Fail(message) => {
                        yield Err(GatewayError::Stream(message));
                        return;
                    }
                    Step::Pause(duration) => {
                        tokio::time::sleep(duration).await;
                    }
                    Step::UploadFile(name) => {
                        let path = self.workspace.join(&name);
                        if let Err(e) = tokio::fs::write(&path, b"artifact").await {
                            yield Err(GatewayError::Io(e));
                            return;
                        }
                        let input = json!({ "filepath": path.to_string_lossy() });
                        let text = match self.call(UPLOAD_TOOL_NAME, input).await {
                            Ok(value) => value.as_str().unwrap_or_default().to_string(),
                            Err(e) => e.to_string(),
                        };
                        self.uploads
                            .lock()
                            .unwrap()
                            .push((self.session_id.clone(), text.clone()));
                        yield Ok(tool_result_event(&text));
                    }
                    Step::CallTool(name, input) => {
                        let text = match self.call(&name, input).await {
                            Ok(serde_json::Value::String(text)) => text,
                            Ok(value) => value.to_string(),
                            Err(e) => e.to_string(),
                        };
                        yield Ok(tool_result_event(&text));
                    }
                }
            }
        })
    }
}

/// Blob store that records puts instead of transferring anything.
#[derive(Default)]
pub struct RecordingBlobStore {
    pub puts: Mutex<Vec<(String, String, PathBuf)>>,
}

#[async_trait]
impl BlobStore for RecordingBlobStore {
    async fn put(&self, bucket: &str, key: &str, local_path: &Path) -> Result<()> {
        self.puts.lock().unwrap().push((
            bucket.to_string(),
            key.to_string(),
            local_path.to_path_buf(),
        ));
        Ok(())
    }
}

/// In-process provider: lists fixed tools and echoes call arguments.
pub struct EchoConnection {
    name: String,
    tools: Vec<String>,
    fail_start: bool,
    shutdowns: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ProviderConnection for EchoConnection {
    async fn start(&mut self) -> Result<()> {
        if self.fail_start {
            return Err(GatewayError::process(&self.name, "executable not found"));
        }
        Ok(())
    }

    async fn list_tools(&mut self) -> Result<Vec<MCPToolSchema>> {
        Ok(self
            .tools
            .iter()
            .map(|name| MCPToolSchema {
                name: name.clone(),
                description: Some(format!("{name} from {}", self.name)),
                input_schema: json!({ "type": "object" }),
            })
            .collect())
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult> {
        Ok(MCPToolCallResult {
            structured_content: None,
            text_content: Some(format!("{name} <- {arguments}")),
            content: Vec::new(),
        })
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.shutdowns.lock().unwrap().push(self.name.clone());
        Ok(())
    }
}

/// Launches [`EchoConnection`]s; providers not registered fail to start.
#[derive(Default)]
pub struct EchoLauncher {
    tools: HashMap<String, Vec<String>>,
    pub launched: Mutex<Vec<String>>,
    pub shutdowns: Arc<Mutex<Vec<String>>>,
}

impl EchoLauncher {
    pub fn with_provider(mut self, name: &str, tools: &[&str]) -> Self {
        self.tools
            .insert(name.to_string(), tools.iter().map(|t| t.to_string()).collect());
        self
    }
}

impl ProviderLauncher for EchoLauncher {
    fn launch(&self, spec: &ProviderSpec) -> Box<dyn ProviderConnection> {
        self.launched.lock().unwrap().push(spec.name.clone());
        let tools = self.tools.get(&spec.name).cloned();
        Box::new(EchoConnection {
            name: spec.name.clone(),
            fail_start: tools.is_none(),
            tools: tools.unwrap_or_default(),
            shutdowns: Arc::clone(&self.shutdowns),
        })
    }
}

pub fn driver(
    config: Arc<GatewayConfig>,
    registry: Arc<ToolRegistry>,
    engine: Arc<dyn AgentEngine>,
    store: Arc<dyn BlobStore>,
) -> SessionDriver {
    SessionDriver::new(config, registry, engine, store)
}

/// Directory entries directly under `root`.
pub fn entries(root: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(root)
        .map(|dir| dir.filter_map(|e| e.ok().map(|e| e.path())).collect())
        .unwrap_or_default()
}
