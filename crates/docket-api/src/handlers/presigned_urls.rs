use crate::auth::SessionContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, Json};
use docket_core::models::{PresignedUrlsRequest, UploadCredential};
use docket_core::AppError;
use std::sync::Arc;
use validator::Validate;

/// Issue one presigned PUT URL per declared file
#[utoipa::path(
    post,
    path = "/presigned-urls",
    tag = "uploads",
    request_body = PresignedUrlsRequest,
    responses(
        (status = 200, description = "Credentials in request order", body = [UploadCredential]),
        (status = 400, description = "Invalid input or batch refused by policy", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Credentials could not be signed", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, session, body),
    fields(operation = "issue_upload_credentials")
)]
pub async fn create_presigned_urls(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    body: Result<ValidatedJson<PresignedUrlsRequest>, HttpAppError>,
) -> Result<Json<Vec<UploadCredential>>, HttpAppError> {
    // Authentication is decided before anything about the body is reported
    let identity = state.issuer.resolve(&session).await?;
    let ValidatedJson(request) = body?;
    if request.validate().is_err() {
        return Err(AppError::InvalidInput("Invalid files input".to_string()).into());
    }

    let credentials = state.issuer.issue_for(&identity, &request.files)?;
    Ok(Json(credentials))
}
