//! Stdio transport: launches a provider process and speaks MCP over its pipes.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rmcp::model::ClientInfo;
use rmcp::service::{ClientInitializeError, DynService, RoleClient, RunningService, ServiceExt};
use rmcp::transport::TokioChildProcess;
use tokio::process::Command;

use super::manifest::ProviderSpec;

pub type DynClientService = Box<dyn DynService<RoleClient>>;
pub type MCPRunningService = RunningService<RoleClient, DynClientService>;

/// Host variables every provider inherits before any overrides.
const PASSTHROUGH_ENV: [&str; 6] = ["HOME", "LOGNAME", "PATH", "SHELL", "TERM", "USER"];

/// Overlay `overrides` on `baseline`; override keys win.
pub fn merge_env(
    baseline: &BTreeMap<String, String>,
    overrides: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = baseline.clone();
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Transport trait for MCP communication.
#[async_trait]
pub trait MCPTransport: Send {
    /// Launch the peer and run the initialize handshake.
    async fn connect(
        &mut self,
        client_info: ClientInfo,
    ) -> Result<MCPRunningService, ClientInitializeError>;

    /// Refuse further connects.
    fn close(&mut self);
}

/// Stdio-based MCP transport for local provider processes.
pub struct StdioTransport {
    command: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    closed: bool,
}

impl StdioTransport {
    /// Create a stdio transport from command and args.
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: BTreeMap::new(),
            closed: false,
        }
    }

    /// Transport for a manifest entry, with its env layered over `baseline`.
    pub fn from_spec(spec: &ProviderSpec, baseline: &BTreeMap<String, String>) -> Self {
        Self {
            env: merge_env(baseline, &spec.env),
            ..Self::new(spec.command.clone(), spec.args.clone())
        }
    }

    fn build_command(&self) -> Command {
        let mut command = Command::new(&self.command);
        command.args(&self.args).env_clear();
        for key in PASSTHROUGH_ENV {
            if let Ok(value) = std::env::var(key) {
                command.env(key, value);
            }
        }
        command.envs(&self.env);
        command
    }
}

#[async_trait]
impl MCPTransport for StdioTransport {
    async fn connect(
        &mut self,
        client_info: ClientInfo,
    ) -> Result<MCPRunningService, ClientInitializeError> {
        if self.closed {
            return Err(ClientInitializeError::ConnectionClosed(
                "MCP transport closed".into(),
            ));
        }

        let transport = TokioChildProcess::new(self.build_command()).map_err(|error| {
            ClientInitializeError::transport::<TokioChildProcess>(error, "spawn stdio transport")
        })?;

        client_info.into_dyn().serve(transport).await
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
