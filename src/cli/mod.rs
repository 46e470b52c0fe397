//! Command-line overrides for the gateway binary.

use std::path::PathBuf;

use clap::Parser;

use crate::config::GatewayConfig;

/// Streaming agent gateway backed by MCP tool providers
#[derive(Parser, Debug, Default)]
#[command(name = "mcp-gateway", version, about)]
pub struct Cli {
    /// Provider manifest (JSON with an `mcpServers` map)
    #[arg(long, env = "MCP_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8080
    #[arg(long, env = "BIND_ADDRESS")]
    pub bind: Option<String>,

    /// Root under which per-session workspaces are created
    #[arg(long, env = "WORKSPACE_DIR")]
    pub workspace_dir: Option<PathBuf>,
}

impl Cli {
    /// Apply any values given on the command line on top of `config`.
    pub fn apply(self, config: &mut GatewayConfig) {
        if let Some(manifest) = self.manifest {
            config.manifest_path = manifest;
        }
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(workspace_dir) = self.workspace_dir {
            config.workspace_root = workspace_dir;
        }
    }
}
