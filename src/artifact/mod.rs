//! Artifact hand-off: the blob-store boundary and the upload tool built on it.

pub mod store;
pub mod upload;

pub use store::{object_url, BlobStore, S3BlobStore};
pub use upload::ArtifactUploader;
