//! Streaming session driver: one request from session start to cleanup.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::chunk::{chunks_for, Chunk};
use super::workspace::{self, CleanupGuard};
use super::Session;
use crate::agent::{
    classify, convert_messages, AgentEngine, AgentSpec, InboundMessage, ModelSelection,
};
use crate::artifact::{ArtifactUploader, BlobStore};
use crate::config::GatewayConfig;
use crate::error::Result;
use crate::mcp::ToolRegistry;
use crate::tools::ToolHandle;

/// Body of `POST /streaming`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
    pub model: ModelSelection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    Init,
    WorkspaceReady,
    AgentRunning,
    Draining,
    Closed,
    ClosedWithError,
}

fn enter(state: &mut SessionState, next: SessionState, session: &Session) {
    debug!(session_id = %session.id, from = %state, to = %next, "session state");
    *state = next;
}

/// Drives agent executions for incoming requests.
///
/// Cheap to clone; every collaborator is shared.
#[derive(Clone)]
pub struct SessionDriver {
    config: Arc<GatewayConfig>,
    registry: Arc<ToolRegistry>,
    engine: Arc<dyn AgentEngine>,
    store: Arc<dyn BlobStore>,
}

impl SessionDriver {
    pub fn new(
        config: Arc<GatewayConfig>,
        registry: Arc<ToolRegistry>,
        engine: Arc<dyn AgentEngine>,
        store: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            config,
            registry,
            engine,
            store,
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// NDJSON lines for `request`, one per chunk.
    pub fn stream(&self, request: StreamingRequest) -> BoxStream<'static, Result<String>> {
        self.stream_chunks(request)
            .map(|chunk| chunk.to_line())
            .boxed()
    }

    /// Run one session and yield its chunks.
    ///
    /// The workspace is removed once the stream finishes, or when the stream
    /// is dropped early, whichever comes first.
    pub fn stream_chunks(&self, request: StreamingRequest) -> BoxStream<'static, Chunk> {
        let driver = self.clone();

        let stream = async_stream::stream! {
            let session = Session::new(&driver.config.workspace_root);
            let session_id = session.id.to_string();
            let mut state = SessionState::Init;
            info!(session_id = %session_id, model = %request.model.model_id, "new session");
            let guard = CleanupGuard::new(session_id.clone(), session.workspace.clone());

            let mut failed = false;
            match workspace::create(&session.workspace).await {
                Ok(()) => enter(&mut state, SessionState::WorkspaceReady, &session),
                Err(e) => {
                    error!(session_id = %session_id, error = %e, "workspace creation failed");
                    failed = true;
                    yield Chunk::text(format!("Failed to prepare the session workspace: {e}"));
                }
            }

            if !failed {
                let spec = driver.agent_spec(&session, &request);
                match driver.engine.create(spec) {
                    Err(e) => {
                        error!(session_id = %session_id, error = %e, "agent construction failed");
                        failed = true;
                        yield Chunk::text(format!("Failed to create the agent: {e}"));
                    }
                    Ok(execution) => {
                        enter(&mut state, SessionState::AgentRunning, &session);
                        let mut events = execution.stream(request.user_prompt.clone());
                        while let Some(event) = events.next().await {
                            match event {
                                Ok(event) => {
                                    for chunk in chunks_for(classify(&event)) {
                                        yield chunk;
                                    }
                                }
                                Err(e) => {
                                    error!(session_id = %session_id, error = %e, "agent stream failed");
                                    failed = true;
                                    yield Chunk::text(format!(
                                        "An error occurred while streaming the response: {e}"
                                    ));
                                    break;
                                }
                            }
                        }
                    }
                }
            }

            enter(&mut state, SessionState::Draining, &session);
            guard.run().await;
            let closed = if failed {
                SessionState::ClosedWithError
            } else {
                SessionState::Closed
            };
            enter(&mut state, closed, &session);
        };

        stream.boxed()
    }

    fn agent_spec(&self, session: &Session, request: &StreamingRequest) -> AgentSpec {
        let session_id = session.id.to_string();
        let uploader = ArtifactUploader::new(
            Arc::clone(&self.store),
            self.config.file_bucket.clone(),
            self.config.aws_region.clone(),
            session.workspace.clone(),
            session_id.clone(),
        );

        let mut tools: Vec<ToolHandle> = self.registry.snapshot().iter().cloned().collect();
        tools.push(Arc::new(uploader.into_tool()));

        AgentSpec {
            system_prompt: format!(
                "{}\n{}",
                request.system_prompt,
                self.config.fixed_system_prompt(&session.workspace)
            ),
            messages: convert_messages(&request.messages),
            model: request.model.clone(),
            tools,
            session_id,
        }
    }
}
