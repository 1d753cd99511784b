use crate::auth::{Identity, SessionContext};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use docket_core::models::{SubmissionRecord, SubmissionRequest};
use docket_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

async fn require_identity(
    state: &AppState,
    session: &SessionContext,
) -> Result<Identity, HttpAppError> {
    state
        .resolver
        .resolve(session)
        .await
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()).into())
}

/// Record a case submission once all of its files are uploaded
#[utoipa::path(
    post,
    path = "/submissions",
    tag = "submissions",
    request_body = SubmissionRequest,
    responses(
        (status = 201, description = "Submission recorded", body = SubmissionRecord),
        (status = 400, description = "Invalid fields or file keys", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Submission could not be stored", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, session, body), fields(operation = "record_submission"))]
pub async fn create_submission(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    body: Result<ValidatedJson<SubmissionRequest>, HttpAppError>,
) -> Result<(StatusCode, Json<SubmissionRecord>), HttpAppError> {
    let identity = require_identity(&state, &session).await?;
    let ValidatedJson(request) = body?;

    let record = state
        .recorder
        .record(&identity, request.fields, request.file_keys)
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Get one of the caller's submissions
#[utoipa::path(
    get,
    path = "/submissions/{id}",
    tag = "submissions",
    params(
        ("id" = Uuid, Path, description = "Submission ID")
    ),
    responses(
        (status = 200, description = "Submission found", body = SubmissionRecord),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, session), fields(submission_id = %id))]
pub async fn get_submission(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmissionRecord>, HttpAppError> {
    let identity = require_identity(&state, &session).await?;
    let record = state.recorder.fetch(&identity, id).await?;
    Ok(Json(record))
}
