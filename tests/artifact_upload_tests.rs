mod common;

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::RecordingBlobStore;
use mcp_gateway::artifact::{ArtifactUploader, BlobStore, S3BlobStore};
use mcp_gateway::aws::AwsCredentials;
use mcp_gateway::error::GatewayError;
use mcp_gateway::tools::{Tool, ToolArguments, ToolExecutionContext};

fn s3(server: &MockServer) -> S3BlobStore {
    S3BlobStore::new(
        "us-east-1",
        AwsCredentials::new("AKIDEXAMPLE", "secret", Some("session-token".into())),
    )
    .with_endpoint(server.uri())
}

#[tokio::test]
async fn s3_put_sends_signed_request_to_bucket_path() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/artifacts/mcp/s1/file.txt"))
        .and(header_exists("authorization"))
        .and(header_exists("x-amz-content-sha256"))
        .and(header_exists("x-amz-security-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("file.txt");
    std::fs::write(&file, "contents").unwrap();

    s3(&server)
        .put("artifacts", "mcp/s1/file.txt", &file)
        .await
        .expect("put should succeed");

    let received = server.received_requests().await.unwrap();
    assert_eq!(received[0].body, b"contents");
    let auth = received[0]
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
    assert!(auth.contains("/us-east-1/s3/aws4_request"));
}

#[tokio::test]
async fn s3_rejection_surfaces_as_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403).set_body_string("AccessDenied"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("file.txt");
    std::fs::write(&file, "contents").unwrap();

    let err = s3(&server)
        .put("artifacts", "mcp/s1/file.txt", &file)
        .await
        .unwrap_err();
    assert!(
        matches!(&err, GatewayError::Api { status: 403, message } if message == "AccessDenied"),
        "{err:?}"
    );
}

#[tokio::test]
async fn upload_tool_returns_public_url_for_workspace_file() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/artifacts/mcp/s1/chart.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let workspace = tempfile::tempdir().unwrap();
    let file = workspace.path().join("chart.png");
    std::fs::write(&file, [0u8, 1, 2]).unwrap();

    let tool = ArtifactUploader::new(
        Arc::new(s3(&server)),
        "artifacts",
        "us-east-1",
        workspace.path(),
        "s1",
    )
    .into_tool();

    let url = tool
        .execute(
            &ToolArguments::new(json!({ "filepath": file.to_string_lossy() })),
            &ToolExecutionContext::for_session("s1"),
        )
        .await
        .expect("upload should succeed");

    assert_eq!(
        url,
        json!("https://artifacts.s3.us-east-1.amazonaws.com/mcp/s1/chart.png")
    );
}

#[tokio::test]
async fn file_outside_workspace_is_rejected_before_any_transfer() {
    let workspace = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    let file = elsewhere.path().join("secret.txt");
    std::fs::write(&file, "nope").unwrap();

    let store = Arc::new(RecordingBlobStore::default());
    let uploader = ArtifactUploader::new(
        store.clone(),
        "artifacts",
        "us-east-1",
        workspace.path(),
        "s1",
    );

    let err = uploader
        .upload(&file.to_string_lossy())
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidArgument(_)));

    let escape = workspace.path().join("..").join("secret.txt");
    let err = uploader
        .upload(&escape.to_string_lossy())
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidArgument(_)));

    assert!(store.puts.lock().unwrap().is_empty());
}
