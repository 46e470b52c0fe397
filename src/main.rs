//! mcp-gateway binary entry point.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mcp_gateway::agent::BedrockAgentEngine;
use mcp_gateway::artifact::S3BlobStore;
use mcp_gateway::cli::Cli;
use mcp_gateway::config::GatewayConfig;
use mcp_gateway::mcp::{load_providers, StdioLauncher, ToolRegistry};
use mcp_gateway::server::{self, AppState};
use mcp_gateway::session::{workspace, SessionDriver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = GatewayConfig::from_env()?;
    cli.apply(&mut config);
    let config = Arc::new(config);

    workspace::ensure_root(&config.workspace_root).await?;

    let specs = load_providers(&config.manifest_path)?;
    tracing::info!(count = specs.len(), manifest = %config.manifest_path.display(), "Loaded provider manifest");

    let launcher = Arc::new(StdioLauncher::new(config.baseline_provider_env()));
    let registry = Arc::new(ToolRegistry::build(&specs, launcher, config.failure_policy).await);

    let engine = Arc::new(BedrockAgentEngine::new(
        config.credentials.clone(),
        config.max_agent_turns,
    ));
    let store = Arc::new(S3BlobStore::new(
        config.aws_region.clone(),
        config.credentials.clone(),
    ));
    let driver = SessionDriver::new(Arc::clone(&config), registry, engine, store);

    server::serve(AppState::new(driver, config)).await?;
    Ok(())
}
