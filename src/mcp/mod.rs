//! Tool providers: manifest, stdio transport, client and aggregate registry.

pub mod client;
pub mod manifest;
pub mod registry;
pub mod schema;
pub mod transport;

pub use client::{MCPClient, MCPConnectionState, MCPToolCallResult};
pub use manifest::{load_providers, parse_manifest, ProviderSpec};
pub use registry::{
    Provider, ProviderConnection, ProviderFailurePolicy, ProviderLauncher, StdioLauncher,
    ToolRegistry,
};
pub use schema::MCPToolSchema;
pub use transport::{MCPTransport, StdioTransport};
