//! Per-request sessions: ids, workspaces, chunk wire format and the driver.

pub mod chunk;
pub mod driver;
pub mod workspace;

use std::path::{Path, PathBuf};

use uuid::Uuid;

pub use chunk::{chunks_for, stream_chunk, Chunk};
pub use driver::{SessionDriver, SessionState, StreamingRequest};
pub use workspace::CleanupGuard;

pub type SessionId = Uuid;

/// One streaming request's identity and private workspace.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub workspace: PathBuf,
}

impl Session {
    /// Fresh session whose workspace is `{root}/{id}`.
    pub fn new(root: &Path) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            workspace: root.join(id.to_string()),
        }
    }
}
