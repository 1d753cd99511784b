//! Docket Core Library
//!
//! Domain models, error types, configuration and the upload policy shared by the
//! API service, the storage layer and the upload client.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, Config, ServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
pub use validation::policy::{FileViolation, PolicyViolation, UploadPolicy, ViolationReason};
