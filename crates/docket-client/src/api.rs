//! Domain methods for the Docket API.

use crate::{ApiClient, ApiError};
use async_trait::async_trait;
use docket_core::models::{
    FileDescriptor, PresignedUrlsRequest, SubmissionRecord, SubmissionRequest, UploadCredential,
};

/// The two calls the upload flow makes against the API.
#[async_trait]
pub trait UploadApi: Send + Sync {
    /// Ask for one upload credential per file, in order.
    async fn presigned_urls(
        &self,
        files: &[FileDescriptor],
    ) -> Result<Vec<UploadCredential>, ApiError>;

    /// Record a submission whose files are all uploaded.
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionRecord, ApiError>;
}

#[async_trait]
impl UploadApi for ApiClient {
    async fn presigned_urls(
        &self,
        files: &[FileDescriptor],
    ) -> Result<Vec<UploadCredential>, ApiError> {
        let body = PresignedUrlsRequest {
            files: files.to_vec(),
        };
        self.post_json("/presigned-urls", &body).await
    }

    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionRecord, ApiError> {
        self.post_json("/submissions", request).await
    }
}

impl ApiClient {
    /// Fetch one of the caller's submissions.
    pub async fn submission(&self, id: &str) -> Result<SubmissionRecord, ApiError> {
        self.get(&format!("/submissions/{}", id)).await
    }
}
