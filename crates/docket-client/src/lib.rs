//! Client side of the Docket direct-upload protocol.
//!
//! [`ApiClient`] talks to the Docket API with the caller's session tokens,
//! [`UploadOrchestrator`] moves file bytes straight to object storage through the
//! presigned URLs the API hands out, and [`SubmissionClient`] runs the whole flow.

pub mod api;
pub mod orchestrator;
pub mod submission;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub use api::UploadApi;
pub use orchestrator::{
    BatchState, FileStatus, HttpTransport, ObjectTransport, TransferError, TransferFailure,
    UploadFile, UploadOrchestrator,
};
pub use submission::{SubmissionClient, SubmissionError};

/// Header carrying the id token next to the bearer access token.
pub const ID_TOKEN_HEADER: &str = "X-Id-Token";

const DEFAULT_API_URL: &str = "http://localhost:4000";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API request failed with status {status}: {message}")]
    Status {
        status: StatusCode,
        code: Option<String>,
        message: String,
    },

    #[error("failed to reach API: {0}")]
    Request(#[from] reqwest::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Request(e) => e.status(),
        }
    }
}

/// The fields of the API's error body the client cares about.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    code: Option<String>,
}

/// Session tokens issued by the identity provider.
#[derive(Clone)]
pub struct Session {
    pub access_token: String,
    pub id_token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("id_token", &"[REDACTED]")
            .finish()
    }
}

/// HTTP client for the Docket API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: String, session: Session) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Create client from environment: DOCKET_API_URL, DOCKET_ACCESS_TOKEN, DOCKET_ID_TOKEN.
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url =
            std::env::var("DOCKET_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let access_token = std::env::var("DOCKET_ACCESS_TOKEN")
            .map_err(|_| anyhow::anyhow!("Missing session. Set DOCKET_ACCESS_TOKEN"))?;
        let id_token = std::env::var("DOCKET_ID_TOKEN")
            .map_err(|_| anyhow::anyhow!("Missing session. Set DOCKET_ID_TOKEN"))?;

        Ok(Self::new(
            base_url,
            Session {
                access_token,
                id_token,
            },
        )?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_session(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.session.access_token)
            .header(ID_TOKEN_HEADER, &self.session.id_token)
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.apply_session(self.client.post(self.build_url(path)).json(body));
        let response = request.send().await?;
        Self::read_json(response).await
    }

    /// GET and deserialize response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.apply_session(self.client.get(self.build_url(path)));
        let response = request.send().await?;
        Self::read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => (body.code, body.error),
                Err(_) => (None, text),
            };
            return Err(ApiError::Status {
                status,
                code,
                message,
            });
        }

        Ok(response.json().await?)
    }
}
