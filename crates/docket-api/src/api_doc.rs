//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use docket_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Docket Upload API",
        version = "0.1.0",
        description = "Direct-to-storage uploads for case documents. Clients obtain short-lived presigned PUT URLs, upload each file straight to object storage, then record the submission."
    ),
    paths(
        handlers::presigned_urls::create_presigned_urls,
        handlers::submissions::create_submission,
        handlers::submissions::get_submission,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::FileDescriptor,
            models::PresignedUrlsRequest,
            models::UploadCredential,
            models::SubmissionFields,
            models::SubmissionRequest,
            models::SubmissionRecord,
            handlers::health::HealthResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "uploads", description = "Upload credential issuance"),
        (name = "submissions", description = "Case submissions referencing uploaded files"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
