//! Blob store boundary and its S3 implementation.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::aws::sigv4::encode_path_segments;
use crate::aws::{sha256_hex, sign_request, AwsCredentials, SigningParams};
use crate::error::{GatewayError, Result};

/// Public locator for an object in a virtual-hosted S3 bucket.
pub fn object_url(bucket: &str, region: &str, key: &str) -> String {
    format!("https://{bucket}.s3.{region}.amazonaws.com/{key}")
}

/// Put-and-locate interface over durable storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Copy the file at `local_path` to `bucket/key`.
    async fn put(&self, bucket: &str, key: &str, local_path: &Path) -> Result<()>;

    /// Locator handed back to the agent after a successful put.
    fn object_url(&self, bucket: &str, region: &str, key: &str) -> String {
        object_url(bucket, region, key)
    }
}

/// S3 over plain HTTPS with SigV4-signed `PUT`s.
pub struct S3BlobStore {
    client: reqwest::Client,
    region: String,
    credentials: AwsCredentials,
    endpoint: Option<String>,
}

impl S3BlobStore {
    pub fn new(region: impl Into<String>, credentials: AwsCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            region: region.into(),
            credentials,
            endpoint: None,
        }
    }

    /// Send requests path-style to `endpoint` instead of the regional host.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    fn request_url(&self, bucket: &str, key: &str) -> Result<reqwest::Url> {
        let key = encode_path_segments(key);
        let raw = match &self.endpoint {
            Some(endpoint) => format!("{}/{bucket}/{key}", endpoint.trim_end_matches('/')),
            None => format!("https://{bucket}.s3.{}.amazonaws.com/{key}", self.region),
        };
        reqwest::Url::parse(&raw)
            .map_err(|e| GatewayError::InvalidArgument(format!("invalid object url {raw}: {e}")))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, bucket: &str, key: &str, local_path: &Path) -> Result<()> {
        let body = tokio::fs::read(local_path).await?;
        let payload_hash = sha256_hex(&body);
        let size = body.len();

        let mut request = self
            .client
            .put(self.request_url(bucket, key)?)
            .body(body)
            .build()?;
        sign_request(
            &mut request,
            &payload_hash,
            &SigningParams {
                credentials: &self.credentials,
                region: &self.region,
                service: "s3",
                time: Utc::now(),
            },
        )?;

        let response = self.client.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!(bucket, key, bytes = size, "stored artifact");
        Ok(())
    }
}
