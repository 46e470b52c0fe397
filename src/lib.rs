//! mcp-gateway: a streaming agent endpoint whose tools come from MCP
//! provider subprocesses.
//!
//! Startup reads a provider manifest, launches every provider and builds one
//! shared [`mcp::ToolRegistry`]. Each `POST /streaming` request then runs a
//! [`session::SessionDriver`] session: a private workspace, an agent run with
//! the registry's tools plus a session-bound upload tool, and an NDJSON chunk
//! stream rendered from the agent's events.

pub mod agent;
pub mod artifact;
pub mod aws;
pub mod cli;
pub mod config;
pub mod error;
pub mod mcp;
pub mod server;
pub mod session;
pub mod tools;
