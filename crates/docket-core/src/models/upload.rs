use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Declared type and size of one file the client intends to upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileDescriptor {
    /// MIME type the client will send as `Content-Type`
    #[serde(rename = "fileType")]
    pub content_type: String,
    /// Exact byte length the client will send as `Content-Length`
    #[serde(rename = "fileSize")]
    pub byte_size: u64,
}

impl FileDescriptor {
    pub fn new(content_type: impl Into<String>, byte_size: u64) -> Self {
        Self {
            content_type: content_type.into(),
            byte_size,
        }
    }
}

/// Request body for `POST /presigned-urls`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct PresignedUrlsRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Invalid files input"))]
    pub files: Vec<FileDescriptor>,
}

/// Short-lived write grant for exactly one object.
///
/// `url` is opaque: it must be used as-is for a single `PUT` with the declared
/// content type and length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadCredential {
    #[serde(rename = "fileKey")]
    pub storage_key: String,
    pub url: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}
