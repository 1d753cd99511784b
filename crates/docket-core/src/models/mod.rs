pub mod submission;
pub mod upload;

pub use submission::{CaseType, SubmissionFields, SubmissionRecord, SubmissionRequest, TribunalType};
pub use upload::{FileDescriptor, PresignedUrlsRequest, UploadCredential};
