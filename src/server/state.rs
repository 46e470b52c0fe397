use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::mcp::ToolRegistry;
use crate::session::SessionDriver;

/// Shared application state accessible to all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub driver: SessionDriver,
    pub registry: Arc<ToolRegistry>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    pub fn new(driver: SessionDriver, config: Arc<GatewayConfig>) -> Self {
        Self {
            registry: Arc::clone(driver.registry()),
            driver,
            config,
        }
    }
}
