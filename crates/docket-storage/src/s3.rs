use crate::presign::{PresignedPut, SigV4Presigner, SigningCredentials};
use crate::traits::{Storage, StorageError, StorageResult, UploadSigner};
use crate::StorageBackend;
use async_trait::async_trait;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::ObjectStoreExt;
use std::time::Duration;

/// S3 storage implementation
///
/// Object inspection goes through `object_store`; write grants are signed locally
/// with the same credentials.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    presigner: SigV4Presigner,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `credentials` - Key pair used both for `HEAD` requests and for signing grants
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        credentials: SigningCredentials,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone())
            .with_access_key_id(credentials.access_key_id.clone())
            .with_secret_access_key(credentials.secret_access_key.clone());

        if let Some(ref token) = credentials.session_token {
            builder = builder.with_token(token.clone());
        }

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let presigner =
            SigV4Presigner::new(bucket.clone(), region, endpoint_url.as_deref(), credentials)?;

        Ok(S3Storage {
            store,
            presigner,
            bucket,
        })
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let start = std::time::Instant::now();
        let location = Path::from(storage_key.to_string());

        match self.store.head(&location).await {
            Ok(meta) => {
                tracing::debug!(
                    bucket = %self.bucket,
                    key = %storage_key,
                    size_bytes = meta.size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 object found"
                );
                Ok(true)
            }
            Err(ObjectStoreError::NotFound { .. }) => {
                tracing::debug!(
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 object missing"
                );
                Ok(false)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 head failed"
                );
                Err(StorageError::BackendError(e.to_string()))
            }
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

impl UploadSigner for S3Storage {
    fn presign_put(
        &self,
        storage_key: &str,
        content_type: &str,
        content_length: u64,
        expires_in: Duration,
    ) -> StorageResult<PresignedPut> {
        self.presigner
            .presign_put(storage_key, content_type, content_length, expires_in)
    }
}
