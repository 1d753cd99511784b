#[cfg(feature = "storage-memory")]
use crate::MemoryStorage;
#[cfg(feature = "storage-s3")]
use crate::{S3Storage, SigningCredentials};
use crate::{Storage, StorageBackend, StorageError, StorageResult, UploadSigner};
use docket_core::Config;
use std::sync::Arc;

/// Both views of the configured backend.
#[derive(Clone)]
pub struct StorageHandles {
    pub storage: Arc<dyn Storage>,
    pub signer: Arc<dyn UploadSigner>,
}

impl StorageHandles {
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: Storage + UploadSigner + 'static,
    {
        Self {
            storage: backend.clone(),
            signer: backend,
        }
    }
}

/// Create a storage backend based on configuration
pub fn create_storage(config: &Config) -> StorageResult<StorageHandles> {
    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config
                .s3_region()
                .map(String::from)
                .or_else(|| config.aws_region().map(String::from))
                .ok_or_else(|| {
                    StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
                })?;
            let endpoint = config.s3_endpoint().map(String::from);
            let credentials = SigningCredentials {
                access_key_id: config
                    .aws_access_key_id()
                    .map(String::from)
                    .ok_or_else(|| {
                        StorageError::ConfigError("AWS_ACCESS_KEY_ID not configured".to_string())
                    })?,
                secret_access_key: config
                    .aws_secret_access_key()
                    .map(String::from)
                    .ok_or_else(|| {
                        StorageError::ConfigError(
                            "AWS_SECRET_ACCESS_KEY not configured".to_string(),
                        )
                    })?,
                session_token: config.aws_session_token().map(String::from),
            };

            let storage = S3Storage::new(bucket, region, endpoint, credentials)?;
            Ok(StorageHandles::from_backend(Arc::new(storage)))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-memory")]
        StorageBackend::Memory => {
            let storage = MemoryStorage::new()?;
            Ok(StorageHandles::from_backend(Arc::new(storage)))
        }

        #[cfg(not(feature = "storage-memory"))]
        StorageBackend::Memory => Err(StorageError::ConfigError(
            "Memory storage backend not available (storage-memory feature not enabled)"
                .to_string(),
        )),
    }
}
