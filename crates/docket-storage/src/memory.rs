//! In-process object store that honours presigned grants.
//!
//! Used for development and tests. Grants are real SigV4 URLs pointing at
//! [`MEMORY_ENDPOINT`]; [`MemoryStorage::put_object`] accepts a write only when the
//! grant verifies and the body matches the signed length.

use crate::presign::{GrantError, PresignedPut, SigV4Presigner, SigningCredentials};
use crate::traits::{Storage, StorageResult, UploadSigner};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

pub const MEMORY_ENDPOINT: &str = "http://storage.memory.local";
const MEMORY_BUCKET: &str = "docket-memory";
const MEMORY_REGION: &str = "us-east-1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub body: Bytes,
}

/// Memory storage implementation
#[derive(Clone)]
pub struct MemoryStorage {
    presigner: SigV4Presigner,
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl MemoryStorage {
    pub fn new() -> StorageResult<Self> {
        let presigner = SigV4Presigner::new(
            MEMORY_BUCKET.to_string(),
            MEMORY_REGION.to_string(),
            Some(MEMORY_ENDPOINT),
            SigningCredentials {
                access_key_id: "memory-access-key".to_string(),
                secret_access_key: "memory-secret-access-key".to_string(),
                session_token: None,
            },
        )?;

        Ok(Self {
            presigner,
            objects: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Accept a `PUT` to a presigned URL.
    pub async fn put_object(
        &self,
        url: &str,
        content_type: &str,
        content_length: u64,
        body: Bytes,
    ) -> Result<String, GrantError> {
        self.put_object_at(url, content_type, content_length, body, Utc::now())
            .await
    }

    /// Accept a `PUT` as of `now`. Returns the stored key.
    pub async fn put_object_at(
        &self,
        url: &str,
        content_type: &str,
        content_length: u64,
        body: Bytes,
        now: DateTime<Utc>,
    ) -> Result<String, GrantError> {
        if body.len() as u64 != content_length {
            return Err(GrantError::Malformed(format!(
                "body is {} bytes, Content-Length says {}",
                body.len(),
                content_length
            )));
        }

        let key = self
            .presigner
            .verify_put(url, content_type, content_length, now)?;

        tracing::debug!(key = %key, size_bytes = content_length, "Memory object stored");

        self.objects.write().await.insert(
            key.clone(),
            StoredObject {
                content_type: content_type.trim().to_string(),
                body,
            },
        );
        Ok(key)
    }

    pub async fn get(&self, storage_key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(storage_key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.objects.read().await.contains_key(storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

impl UploadSigner for MemoryStorage {
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
