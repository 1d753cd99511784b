//! Docket Database Library
//!
//! Persistence for submission records.

pub mod db;

pub use db::{
    create_submission_store, MemorySubmissionStore, PgSubmissionStore, SubmissionStore,
};
