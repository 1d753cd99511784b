//! Credential issuance for direct uploads
//!
//! `issue` authenticates the caller, checks the batch against the authoritative
//! policy and then mints one presigned `PUT` per file. Nothing is written to
//! storage or to the database here.

use crate::auth::{Identity, SessionContext, SessionResolver};
use docket_core::models::{FileDescriptor, UploadCredential};
use docket_core::{AppError, PolicyViolation, UploadPolicy};
use docket_storage::{next_key, StorageError, UploadSigner};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IssuerError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("upload batch rejected: {0}")]
    PolicyRejected(#[from] PolicyViolation),

    #[error("failed to issue upload credentials: {0}")]
    Backend(#[from] StorageError),
}

impl From<IssuerError> for AppError {
    fn from(err: IssuerError) -> Self {
        match err {
            IssuerError::Unauthenticated => AppError::Unauthorized("Not authenticated".to_string()),
            IssuerError::PolicyRejected(violation) => AppError::PolicyRejected(violation),
            IssuerError::Backend(e) => AppError::Storage(e.to_string()),
        }
    }
}

pub struct CredentialIssuer {
    resolver: Arc<dyn SessionResolver>,
    signer: Arc<dyn UploadSigner>,
    policy: UploadPolicy,
    expiry: Duration,
}

impl CredentialIssuer {
    pub fn new(
        resolver: Arc<dyn SessionResolver>,
        signer: Arc<dyn UploadSigner>,
        policy: UploadPolicy,
        expiry: Duration,
    ) -> Self {
        Self {
            resolver,
            signer,
            policy,
            expiry,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub async fn resolve(&self, session: &SessionContext) -> Result<Identity, IssuerError> {
        self.resolver
            .resolve(session)
            .await
            .ok_or(IssuerError::Unauthenticated)
    }

    /// Credentials for an already resolved caller, in the same order as `batch`.
    pub fn issue_for(
        &self,
        identity: &Identity,
        batch: &[FileDescriptor],
    ) -> Result<Vec<UploadCredential>, IssuerError> {
        if let Err(violation) = self.policy.validate(batch) {
            tracing::info!(
                identity = %identity,
                file_count = batch.len(),
                offending = violation.files().len(),
                "Upload batch rejected by policy"
            );
            return Err(violation.into());
        }

        let credentials = batch
            .iter()
            .map(|file| self.credential_for(identity, file))
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| {
                tracing::error!(error = %e, identity = %identity, "Credential signing failed");
            })?;

        tracing::info!(
            identity = %identity,
            file_count = credentials.len(),
            expiry_secs = self.expiry.as_secs(),
            "Upload credentials issued"
        );

        Ok(credentials)
    }

    fn credential_for(
        &self,
        identity: &Identity,
        file: &FileDescriptor,
    ) -> Result<UploadCredential, StorageError> {
        let storage_key = next_key(identity.as_str(), &file.content_type)?;
        let grant = self.signer.presign_put(
            &storage_key,
            &file.content_type,
            file.byte_size,
            self.expiry,
        )?;

        tracing::debug!(
            storage_key = %storage_key,
            content_type = %file.content_type,
            size_bytes = file.byte_size,
            "Presigned PUT minted"
        );

        Ok(UploadCredential {
            storage_key,
            url: grant.url,
            expires_at: grant.expires_at,
        })
    }
}
