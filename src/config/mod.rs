//! Gateway configuration, built once at startup and shared by reference.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bon::Builder;

use crate::aws::AwsCredentials;
use crate::error::{GatewayError, Result};
use crate::mcp::ProviderFailurePolicy;

pub const DEFAULT_MANIFEST_PATH: &str = "mcp.json";
pub const DEFAULT_WORKSPACE_DIR: &str = "/tmp/ws";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_AGENT_TURNS: usize = 20;

/// Name under which the artifact upload tool is exposed to the model.
pub const UPLOAD_TOOL_NAME: &str = "upload_file_to_s3_and_retrieve_s3_url";

/// Explicit runtime configuration.
///
/// Everything that used to be read from the process environment on demand is
/// resolved here once, then passed as `Arc<GatewayConfig>` to the components
/// that need it.
#[derive(Debug, Clone, Builder)]
pub struct GatewayConfig {
    #[builder(into, default = PathBuf::from(DEFAULT_MANIFEST_PATH))]
    pub manifest_path: PathBuf,
    /// Process-wide workspace root; each session gets a subdirectory.
    #[builder(into, default = PathBuf::from(DEFAULT_WORKSPACE_DIR))]
    pub workspace_root: PathBuf,
    #[builder(into, default = DEFAULT_BIND_ADDRESS.to_string())]
    pub bind_address: String,
    #[builder(into)]
    pub file_bucket: String,
    #[builder(into)]
    pub aws_region: String,
    pub credentials: AwsCredentials,
    #[builder(default = DEFAULT_MAX_AGENT_TURNS)]
    pub max_agent_turns: usize,
    #[builder(default)]
    pub failure_policy: ProviderFailurePolicy,
}

impl GatewayConfig {
    /// Load from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let credentials = AwsCredentials::from_env()?;
        let failure_policy = match optional_var("PROVIDER_FAILURE_POLICY") {
            Some(raw) => raw.parse::<ProviderFailurePolicy>().map_err(|_| {
                GatewayError::Configuration(format!(
                    "PROVIDER_FAILURE_POLICY must be 'isolate' or 'discard-all', got '{raw}'"
                ))
            })?,
            None => ProviderFailurePolicy::default(),
        };
        let max_agent_turns = match optional_var("MAX_AGENT_TURNS") {
            Some(raw) => raw.parse::<usize>().map_err(|e| {
                GatewayError::Configuration(format!("MAX_AGENT_TURNS is not a number: {e}"))
            })?,
            None => DEFAULT_MAX_AGENT_TURNS,
        };

        Ok(Self {
            manifest_path: optional_var("MCP_MANIFEST")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST_PATH)),
            workspace_root: optional_var("WORKSPACE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKSPACE_DIR)),
            bind_address: optional_var("BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            file_bucket: required_var("FILE_BUCKET")?,
            aws_region: required_var("AWS_REGION")?,
            credentials,
            max_agent_turns,
            failure_policy,
        })
    }

    /// Environment every provider subprocess starts from, before its own
    /// manifest `env` is applied on top.
    pub fn baseline_provider_env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::from([
            ("UV_NO_CACHE".to_string(), "1".to_string()),
            ("UV_PYTHON".to_string(), "/usr/local/bin/python".to_string()),
            ("UV_TOOL_DIR".to_string(), "/tmp/.uv/tool".to_string()),
            ("UV_TOOL_BIN_DIR".to_string(), "/tmp/.uv/tool/bin".to_string()),
            ("UV_PROJECT_ENVIRONMENT".to_string(), "/tmp/.venv".to_string()),
            ("npm_config_cache".to_string(), "/tmp/.npm".to_string()),
            ("AWS_REGION".to_string(), self.aws_region.clone()),
        ]);
        env.extend(self.credentials.to_env());
        env
    }

    /// File-output instructions appended to every caller system prompt.
    pub fn fixed_system_prompt(&self, workspace: &Path) -> String {
        let ws = workspace.display();
        format!(
            "## About File Output\n\
             - When writing files, always write them under `{ws}`.\n\
             - Similarly, if you need a workspace, please use the `{ws}` directory. Do not ask the user about their current workspace. It's always `{ws}`.\n\
             - Also, users cannot directly access files written under `{ws}`. So when submitting these files to users, *always upload them to S3 using the `{UPLOAD_TOOL_NAME}` tool and provide the S3 URL*. The S3 URL must be included in the final output.\n\
             - If the output file is an image file, the S3 URL output must be in Markdown format.\n"
        )
    }
}

fn optional_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn required_var(key: &str) -> Result<String> {
    optional_var(key)
        .ok_or_else(|| GatewayError::Configuration(format!("missing environment variable {key}")))
}
