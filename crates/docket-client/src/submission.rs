//! The full submit flow: preflight, credentials, transfers, record.

use crate::api::UploadApi;
use crate::orchestrator::{BatchState, TransferFailure, UploadFile, UploadOrchestrator};
use crate::ApiError;
use docket_core::models::{SubmissionFields, SubmissionRecord, SubmissionRequest};
use docket_core::{PolicyViolation, UploadPolicy};
use std::sync::Arc;
use thiserror::Error;

/// Why a submission did not go through. Displays the same generic message for every
/// stage; the variant carries the detail.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("submission failed")]
    Preflight(#[source] PolicyViolation),

    #[error("submission failed")]
    Credentials(#[source] ApiError),

    #[error("submission failed")]
    CredentialMismatch { expected: usize, received: usize },

    #[error("submission failed")]
    Upload {
        failures: Vec<TransferFailure>,
        orphaned_keys: Vec<String>,
    },

    #[error("submission failed")]
    Record {
        #[source]
        source: ApiError,
        orphaned_keys: Vec<String>,
    },
}

impl SubmissionError {
    /// Objects left in storage without a submission referencing them.
    pub fn orphaned_keys(&self) -> &[String] {
        match self {
            SubmissionError::Upload { orphaned_keys, .. }
            | SubmissionError::Record { orphaned_keys, .. } => orphaned_keys,
            _ => &[],
        }
    }
}

pub struct SubmissionClient {
    api: Arc<dyn UploadApi>,
    orchestrator: UploadOrchestrator,
    preflight: UploadPolicy,
}

impl SubmissionClient {
    pub fn new(api: Arc<dyn UploadApi>, orchestrator: UploadOrchestrator) -> Self {
        Self {
            api,
            orchestrator,
            preflight: UploadPolicy::preflight(),
        }
    }

    pub fn with_preflight(mut self, policy: UploadPolicy) -> Self {
        self.preflight = policy;
        self
    }

    pub fn preflight(&self) -> &UploadPolicy {
        &self.preflight
    }

    /// Upload `files` and record them as one submission. Nothing is recorded unless
    /// every file reached storage.
    pub async fn submit(
        &self,
        fields: SubmissionFields,
        files: Vec<UploadFile>,
        batch: &mut BatchState,
    ) -> Result<SubmissionRecord, SubmissionError> {
        let descriptors: Vec<_> = files.iter().map(UploadFile::descriptor).collect();

        self.preflight.validate(&descriptors).map_err(|violation| {
            tracing::info!(error = %violation, "Batch refused before upload");
            SubmissionError::Preflight(violation)
        })?;

        let credentials = self
            .api
            .presigned_urls(&descriptors)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, file_count = descriptors.len(), "Credential request failed");
                SubmissionError::Credentials(e)
            })?;

        if credentials.len() != files.len() {
            tracing::error!(
                expected = files.len(),
                received = credentials.len(),
                "Credential count does not match batch"
            );
            return Err(SubmissionError::CredentialMismatch {
                expected: files.len(),
                received: credentials.len(),
            });
        }

        let storage_keys = self
            .orchestrator
            .upload_all(batch, files.into_iter().zip(credentials).collect())
            .await
            .map_err(|failures| {
                for failure in &failures {
                    tracing::warn!(
                        file = %failure.file,
                        storage_key = %failure.storage_key,
                        error = %failure.error,
                        "Transfer failed"
                    );
                }
                SubmissionError::Upload {
                    failures,
                    orphaned_keys: batch.orphaned_keys(),
                }
            })?;

        let request = SubmissionRequest {
            fields,
            file_keys: storage_keys,
        };
        let record = self.api.submit(&request).await.map_err(|e| {
            tracing::error!(
                error = %e,
                orphaned_keys = ?batch.orphaned_keys(),
                "Submission not recorded after upload"
            );
            SubmissionError::Record {
                source: e,
                orphaned_keys: batch.orphaned_keys(),
            }
        })?;

        batch.mark_recorded();
        tracing::info!(
            submission_id = %record.id,
            file_count = record.storage_keys.len(),
            "Submission recorded"
        );
        Ok(record)
    }
}
