//! Docket API Library
//!
//! HTTP surface of the direct-upload service: session resolution, credential
//! issuance, submission recording, and application setup.

mod api_doc;
mod handlers;
mod middleware;
mod telemetry;

pub mod auth;
pub mod error;
pub mod services;
pub mod setup;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use services::{CredentialIssuer, IssuerError, MetadataRecorder, RecorderError};
pub use state::AppState;
