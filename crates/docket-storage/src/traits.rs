//! Storage abstraction traits
//!
//! Backends implement [`Storage`] for object inspection and [`UploadSigner`] for
//! minting write grants. The API holds both behind `Arc<dyn ..>`.

use crate::presign::PresignedPut;
use crate::StorageBackend;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Read-side view of the object store.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Check if an object exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Mints single-object write grants.
///
/// A grant permits exactly one `PUT` to `storage_key` carrying the given
/// `Content-Type` and `Content-Length`, until it expires. Signing is local: no
/// request is made to the backend.
pub trait UploadSigner: Send + Sync {
    fn presign_put(
        &self,
        storage_key: &str,
        content_type: &str,
        content_length: u64,
        expires_in: Duration,
    ) -> StorageResult<PresignedPut>;
}
