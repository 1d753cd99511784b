//! Upload protocol services shared by the HTTP handlers.

pub mod issuer;
pub mod recorder;

pub use issuer::{CredentialIssuer, IssuerError};
pub use recorder::{MetadataRecorder, RecorderError};
