//! Workspace lifecycle.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{GatewayError, Result};

/// Create the process-wide workspace root.
pub async fn ensure_root(root: &Path) -> Result<()> {
    tokio::fs::create_dir_all(root).await?;
    Ok(())
}

/// Create a session workspace; succeeds if it already exists.
pub async fn create(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path).await?;
    debug!(path = %path.display(), "workspace created");
    Ok(())
}

/// Remove a workspace and everything in it. A missing directory is not an error.
pub async fn destroy(path: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(GatewayError::Cleanup {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn destroy_blocking(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(GatewayError::Cleanup {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn log_outcome(session_id: &str, outcome: Result<()>) {
    match outcome {
        Ok(()) => debug!(session_id, "workspace removed"),
        Err(e) => warn!(session_id, error = %e, "workspace cleanup failed"),
    }
}

/// Removes a session workspace exactly once.
///
/// [`CleanupGuard::run`] does it inline; if the guard is dropped first (the
/// client went away mid-stream) the drop does it instead.
pub struct CleanupGuard {
    session_id: String,
    path: Option<PathBuf>,
}

impl CleanupGuard {
    pub fn new(session_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            session_id: session_id.into(),
            path: Some(path.into()),
        }
    }

    pub async fn run(mut self) {
        if let Some(path) = self.path.take() {
            log_outcome(&self.session_id, destroy(&path).await);
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        debug!(session_id = %self.session_id, "session dropped before draining");
        let session_id = std::mem::take(&mut self.session_id);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || log_outcome(&session_id, destroy_blocking(&path)));
            }
            Err(_) => log_outcome(&session_id, destroy_blocking(&path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let ws = root.path().join("s1");
        create(&ws).await.unwrap();
        create(&ws).await.unwrap();
        assert!(ws.is_dir());
    }

    #[tokio::test]
    async fn destroy_removes_contents_and_tolerates_missing() {
        let root = tempfile::tempdir().unwrap();
        let ws = root.path().join("s1");
        create(&ws.join("nested")).await.unwrap();
        std::fs::write(ws.join("nested/out.txt"), "x").unwrap();

        destroy(&ws).await.unwrap();
        assert!(!ws.exists());
        destroy(&ws).await.unwrap();
    }

    #[tokio::test]
    async fn guard_run_removes_workspace() {
        let root = tempfile::tempdir().unwrap();
        let ws = root.path().join("s1");
        create(&ws).await.unwrap();

        CleanupGuard::new("s1", &ws).run().await;
        assert!(!ws.exists());
    }

    #[test]
    fn dropped_guard_removes_workspace_outside_runtime() {
        let root = tempfile::tempdir().unwrap();
        let ws = root.path().join("s1");
        std::fs::create_dir_all(&ws).unwrap();

        drop(CleanupGuard::new("s1", &ws));
        assert!(!ws.exists());
    }
}
