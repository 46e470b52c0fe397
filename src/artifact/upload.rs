//! Session-bound artifact upload tool.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use super::store::BlobStore;
use crate::config::UPLOAD_TOOL_NAME;
use crate::error::{GatewayError, Result};
use crate::tools::{AgentTool, AgentToolParameters};

/// Moves files out of one session's workspace into durable storage.
///
/// Each session builds its own uploader, so the destination namespace comes
/// from the value captured here rather than from any shared slot.
pub struct ArtifactUploader {
    store: Arc<dyn BlobStore>,
    bucket: String,
    region: String,
    workspace: PathBuf,
    session_id: String,
}

impl ArtifactUploader {
    pub fn new(
        store: Arc<dyn BlobStore>,
        bucket: impl Into<String>,
        region: impl Into<String>,
        workspace: impl Into<PathBuf>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            region: region.into(),
            workspace: workspace.into(),
            session_id: session_id.into(),
        }
    }

    /// Destination key for `filepath`, or `InvalidArgument` if the path is
    /// not a file inside the session workspace.
    pub fn object_key(&self, filepath: &str) -> Result<String> {
        let path = Path::new(filepath);
        let ws = self.workspace.display();
        let outside = || {
            GatewayError::InvalidArgument(format!(
                "{filepath} does not appear to be a file under the {ws} directory. \
                 Files to be uploaded must exist under {ws}."
            ))
        };

        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(outside());
        }
        let relative = path.strip_prefix(&self.workspace).map_err(|_| outside())?;
        if relative.as_os_str().is_empty() {
            return Err(outside());
        }
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(outside)?;

        Ok(format!("mcp/{}/{file_name}", self.session_id))
    }

    /// Upload `filepath` and return its public locator.
    pub async fn upload(&self, filepath: &str) -> Result<String> {
        let key = self.object_key(filepath)?;
        self.store
            .put(&self.bucket, &key, Path::new(filepath))
            .await?;
        info!(session_id = %self.session_id, key = %key, "uploaded artifact");
        Ok(self.store.object_url(&self.bucket, &self.region, &key))
    }

    /// Expose this uploader to the agent as a tool.
    pub fn into_tool(self) -> AgentTool {
        let description = format!(
            "Upload the file at {}/* and retrieve the s3 path",
            self.workspace.display()
        );
        let parameters = AgentToolParameters::object()
            .string("filepath", "The path to the uploading file", true)
            .build();
        let uploader = Arc::new(self);

        AgentTool::new(
            UPLOAD_TOOL_NAME,
            description,
            parameters,
            move |args, ctx| {
                let uploader = Arc::clone(&uploader);
                async move {
                    if let Some(caller) = ctx.session_id.as_deref() {
                        if caller != uploader.session_id {
                            return Err(GatewayError::InvalidState(format!(
                                "upload tool for session {} called from session {caller}",
                                uploader.session_id
                            )));
                        }
                    }
                    let filepath = args.get_str("filepath")?;
                    let url = uploader.upload(filepath).await?;
                    Ok(serde_json::Value::String(url))
                }
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::tools::{Tool, ToolArguments, ToolExecutionContext};

    #[derive(Default)]
    struct RecordingStore {
        puts: Mutex<Vec<(String, String, PathBuf)>>,
    }

    #[async_trait]
    impl BlobStore for RecordingStore {
        async fn put(&self, bucket: &str, key: &str, local_path: &Path) -> Result<()> {
            self.puts.lock().unwrap().push((
                bucket.to_string(),
                key.to_string(),
                local_path.to_path_buf(),
            ));
            Ok(())
        }
    }

    fn uploader(store: Arc<RecordingStore>) -> ArtifactUploader {
        ArtifactUploader::new(store, "files", "us-east-1", "/tmp/ws/s1", "s1")
    }

    #[tokio::test]
    async fn upload_namespaces_key_under_session() {
        let store = Arc::new(RecordingStore::default());
        let url = uploader(store.clone())
            .upload("/tmp/ws/s1/out/chart.png")
            .await
            .expect("upload should succeed");

        assert_eq!(url, "https://files.s3.us-east-1.amazonaws.com/mcp/s1/chart.png");
        let puts = store.puts.lock().unwrap();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].1, "mcp/s1/chart.png");
        assert_eq!(puts[0].2, PathBuf::from("/tmp/ws/s1/out/chart.png"));
    }

    #[tokio::test]
    async fn path_outside_workspace_is_rejected_without_transfer() {
        let store = Arc::new(RecordingStore::default());
        let err = uploader(store.clone())
            .upload("/etc/passwd")
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::InvalidArgument(m) if m.contains("/tmp/ws/s1")));
        assert!(store.puts.lock().unwrap().is_empty());
    }

    #[test]
    fn string_prefix_sibling_is_not_inside_workspace() {
        let up = uploader(Arc::new(RecordingStore::default()));
        assert!(up.object_key("/tmp/ws/s10/file.txt").is_err());
    }

    #[test]
    fn parent_components_are_rejected() {
        let up = uploader(Arc::new(RecordingStore::default()));
        assert!(up.object_key("/tmp/ws/s1/../s2/file.txt").is_err());
    }

    #[test]
    fn workspace_itself_is_not_a_file() {
        let up = uploader(Arc::new(RecordingStore::default()));
        assert!(up.object_key("/tmp/ws/s1").is_err());
        assert!(up.object_key("/tmp/ws/s1/").is_err());
    }

    #[tokio::test]
    async fn tool_reads_filepath_argument() {
        let store = Arc::new(RecordingStore::default());
        let tool = uploader(store.clone()).into_tool();
        assert_eq!(tool.name(), UPLOAD_TOOL_NAME);

        let out = tool
            .execute(
                &ToolArguments::new(json!({"filepath": "/tmp/ws/s1/a.txt"})),
                &ToolExecutionContext::for_session("s1"),
            )
            .await
            .unwrap();
        assert_eq!(out, json!("https://files.s3.us-east-1.amazonaws.com/mcp/s1/a.txt"));
    }

    #[tokio::test]
    async fn tool_refuses_calls_from_another_session() {
        let store = Arc::new(RecordingStore::default());
        let tool = uploader(store.clone()).into_tool();

        let err = tool
            .execute(
                &ToolArguments::new(json!({"filepath": "/tmp/ws/s1/a.txt"})),
                &ToolExecutionContext::for_session("s2"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidState(_)));
        assert!(store.puts.lock().unwrap().is_empty());
    }
}
