//! Upload orchestration
//!
//! Every file of a batch is `PUT` straight to object storage through its presigned
//! URL. Transfers run concurrently and are awaited together; the batch succeeds only
//! when all of them do. Objects that did land stay in storage and are reported through
//! [`BatchState::orphaned_keys`].

use async_trait::async_trait;
use bytes::Bytes;
use docket_core::models::{FileDescriptor, UploadCredential};
use futures::future::join_all;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// A file picked for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// What the API is told about this file.
    pub fn descriptor(&self) -> FileDescriptor {
        FileDescriptor::new(self.content_type.clone(), self.data.len() as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// The storage backend refused the write (bad signature, wrong type or length, ...)
    #[error("storage rejected upload with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("upload URL expired")]
    Expired,

    #[error("network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferFailure {
    pub file: String,
    pub storage_key: String,
    pub error: TransferError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Pending,
    Uploaded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub file: String,
    pub storage_key: String,
    pub status: FileStatus,
}

/// Per-file progress of one batch, owned by the caller.
#[derive(Debug, Clone, Default)]
pub struct BatchState {
    entries: Vec<BatchEntry>,
    recorded: bool,
}

impl BatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn is_complete(&self) -> bool {
        !self.entries.is_empty()
            && self
                .entries
                .iter()
                .all(|e| e.status == FileStatus::Uploaded)
    }

    /// The submission referencing these uploads was stored.
    pub fn mark_recorded(&mut self) {
        self.recorded = true;
    }

    pub fn is_recorded(&self) -> bool {
        self.recorded
    }

    /// Uploaded objects that no submission references.
    pub fn orphaned_keys(&self) -> Vec<String> {
        if self.recorded {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|e| e.status == FileStatus::Uploaded)
            .map(|e| e.storage_key.clone())
            .collect()
    }

    fn start(&mut self, files: &[(UploadFile, UploadCredential)]) {
        self.recorded = false;
        self.entries = files
            .iter()
            .map(|(file, credential)| BatchEntry {
                file: file.name.clone(),
                storage_key: credential.storage_key.clone(),
                status: FileStatus::Pending,
            })
            .collect();
    }
}

/// Moves bytes to a presigned URL.
#[async_trait]
pub trait ObjectTransport: Send + Sync {
    /// `PUT` `body` with exactly the content type the URL was signed for.
    async fn put(&self, url: &str, content_type: &str, body: Bytes) -> Result<(), TransferError>;
}

/// Plain HTTPS `PUT` to the storage backend.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(300)).build()?;
        Ok(Self { client })
    }
}

/// S3 answers an expired presigned request with 403 and this message.
const EXPIRED_MESSAGE: &str = "Request has expired";

fn classify_rejection(status: StatusCode, body: String) -> TransferError {
    if status == StatusCode::FORBIDDEN && body.contains(EXPIRED_MESSAGE) {
        TransferError::Expired
    } else {
        TransferError::Rejected {
            status: status.as_u16(),
            body,
        }
    }
}

#[async_trait]
impl ObjectTransport for HttpTransport {
    async fn put(&self, url: &str, content_type: &str, body: Bytes) -> Result<(), TransferError> {
        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .send()
            .await
            .map_err(|e| TransferError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        Err(classify_rejection(status, text))
    }
}

pub struct UploadOrchestrator {
    transport: Arc<dyn ObjectTransport>,
}

impl UploadOrchestrator {
    pub fn new(transport: Arc<dyn ObjectTransport>) -> Self {
        Self { transport }
    }

    /// Upload every file to its credential. Returns the storage keys in input order
    /// when all transfers succeed, or every failure otherwise.
    pub async fn upload_all(
        &self,
        batch: &mut BatchState,
        files: Vec<(UploadFile, UploadCredential)>,
    ) -> Result<Vec<String>, Vec<TransferFailure>> {
        batch.start(&files);

        let transfers = files.iter().map(|(file, credential)| async move {
            let started = Instant::now();
            let result = self
                .transport
                .put(&credential.url, &file.content_type, file.data.clone())
                .await;
            tracing::debug!(
                file = %file.name,
                storage_key = %credential.storage_key,
                size_bytes = file.data.len(),
                duration_ms = started.elapsed().as_millis() as u64,
                ok = result.is_ok(),
                "Transfer finished"
            );
            result
        });
        let results = join_all(transfers).await;

        let mut keys = Vec::with_capacity(files.len());
        let mut failures = Vec::new();
        for ((entry, (file, credential)), result) in
            batch.entries.iter_mut().zip(files).zip(results)
        {
            match result {
                Ok(()) => {
                    entry.status = FileStatus::Uploaded;
                    keys.push(credential.storage_key);
                }
                Err(error) => {
                    entry.status = FileStatus::Failed(error.to_string());
                    failures.push(TransferFailure {
                        file: file.name,
                        storage_key: credential.storage_key,
                        error,
                    });
                }
            }
        }

        if failures.is_empty() {
            tracing::info!(file_count = keys.len(), "All transfers succeeded");
            return Ok(keys);
        }

        tracing::warn!(
            failed = failures.len(),
            orphaned_keys = ?batch.orphaned_keys(),
            "Batch upload failed, uploaded objects are left in storage"
        );
        Err(failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn credential(key: &str) -> UploadCredential {
        UploadCredential {
            storage_key: key.to_string(),
            url: format!("https://bucket.example/{}", key),
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn expired_grant_is_recognised() {
        let body = "<Error><Code>AccessDenied</Code><Message>Request has expired</Message></Error>";
        assert_eq!(
            classify_rejection(StatusCode::FORBIDDEN, body.to_string()),
            TransferError::Expired
        );
        assert!(matches!(
            classify_rejection(StatusCode::FORBIDDEN, "SignatureDoesNotMatch".to_string()),
            TransferError::Rejected { status: 403, .. }
        ));
    }

    #[test]
    fn orphans_are_uploaded_but_unrecorded() {
        let files = vec![
            (UploadFile::new("a.png", "image/png", Bytes::new()), credential("k1")),
            (UploadFile::new("b.png", "image/png", Bytes::new()), credential("k2")),
        ];
        let mut batch = BatchState::new();
        batch.start(&files);
        batch.entries[0].status = FileStatus::Uploaded;
        batch.entries[1].status = FileStatus::Failed("boom".to_string());

        assert!(!batch.is_complete());
        assert_eq!(batch.orphaned_keys(), vec!["k1".to_string()]);

        batch.mark_recorded();
        assert!(batch.orphaned_keys().is_empty());
    }

    #[test]
    fn descriptor_uses_actual_length() {
        let file = UploadFile::new("scan.pdf", "application/pdf", Bytes::from_static(b"%PDF-1.7"));
        assert_eq!(file.descriptor(), FileDescriptor::new("application/pdf", 8));
    }
}
