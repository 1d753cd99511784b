//! Database repositories for data access layer
//!
//! Submission records are written once by the recorder and never updated.
//
// Submission repository (trait, Postgres and in-memory implementations)
pub mod submission;

pub use submission::{
    create_submission_store, MemorySubmissionStore, PgSubmissionStore, SubmissionStore,
};
