//! Raw events yielded by an agent execution.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::message::EngineMessage;

/// One loosely-structured step of an agent run.
///
/// Consumers read it through the classifier; nothing here assumes a shape
/// beyond "a JSON value".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentEvent(pub serde_json::Value);

impl AgentEvent {
    pub fn new(payload: serde_json::Value) -> Self {
        Self(payload)
    }

    /// Lifecycle marker emitted once before the first model call.
    pub fn init_event_loop() -> Self {
        Self(json!({ "init_event_loop": true }))
    }

    /// A complete conversation message.
    pub fn message(message: &EngineMessage) -> Self {
        Self(json!({ "message": message }))
    }

    /// Final event carrying the model's stop reason.
    pub fn result(stop_reason: &str) -> Self {
        Self(json!({ "result": { "stopReason": stop_reason } }))
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.0
    }
}
