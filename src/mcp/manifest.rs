//! Declarative provider manifest (`mcp.json`).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// Top-level key holding the provider map.
pub const PROVIDER_MAP_KEY: &str = "mcpServers";

/// One declared tool-provider process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl ProviderSpec {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    /// Reject specs that could never be launched.
    pub fn validate(&self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(GatewayError::Configuration(format!(
                "provider '{}' has an empty command",
                self.name
            )));
        }
        Ok(())
    }
}

/// Manifest entry as written under `mcpServers.<name>`.
#[derive(Debug, Deserialize)]
struct ManifestEntry {
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
}

/// Read and parse the manifest at `path`.
pub fn load_providers(path: impl AsRef<Path>) -> Result<Vec<ProviderSpec>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        GatewayError::Configuration(format!(
            "failed to read provider manifest {}: {e}",
            path.display()
        ))
    })?;
    parse_manifest(&raw)
}

/// Parse manifest JSON into provider specs, in manifest order.
pub fn parse_manifest(raw: &str) -> Result<Vec<ProviderSpec>> {
    let root: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| GatewayError::Configuration(format!("invalid provider manifest: {e}")))?;

    let servers = root
        .get(PROVIDER_MAP_KEY)
        .ok_or_else(|| {
            GatewayError::Configuration(format!("{PROVIDER_MAP_KEY} not defined in manifest"))
        })?
        .as_object()
        .ok_or_else(|| {
            GatewayError::Configuration(format!("{PROVIDER_MAP_KEY} must be an object"))
        })?;

    let mut specs = Vec::with_capacity(servers.len());
    for (name, entry) in servers {
        let entry: ManifestEntry = serde_json::from_value(entry.clone()).map_err(|e| {
            GatewayError::Configuration(format!("invalid manifest entry '{name}': {e}"))
        })?;
        let spec = ProviderSpec {
            name: name.clone(),
            command: entry.command,
            args: entry.args,
            env: entry.env,
        };
        spec.validate()?;
        specs.push(spec);
    }
    Ok(specs)
}
