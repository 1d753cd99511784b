//! Validation modules

pub mod policy;
pub mod sanitize;

pub use sanitize::{parse_positive, sanitize_text, FieldError, MAX_NOTE_LENGTH};
