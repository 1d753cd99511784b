//! Upload policy
//!
//! A single pure check used twice: by the client as an advisory preflight filter and
//! by the credential issuer as the authoritative gate. A batch is accepted only if
//! every file in it passes.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::models::upload::FileDescriptor;

/// Content types accepted when no allow-list is configured.
pub const DEFAULT_ALLOWED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "application/pdf",
];

/// Size bound enforced by the issuer (10 MiB).
pub const AUTHORITATIVE_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Size bound applied by the client before asking for credentials (800 KiB).
pub const PREFLIGHT_MAX_BYTES: u64 = 800 * 1024;

/// Maximum number of files in one batch.
pub const DEFAULT_MAX_FILES: usize = 20;

/// Why a single file was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ViolationReason {
    UnsupportedType,
    TooLarge { size: u64, max: u64 },
    Empty,
}

/// A refused file, identified by its position in the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileViolation {
    pub index: usize,
    #[serde(rename = "fileType")]
    pub content_type: String,
    #[serde(flatten)]
    pub reason: ViolationReason,
}

impl Display for FileViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.reason {
            ViolationReason::UnsupportedType => write!(
                f,
                "file {} has unsupported type '{}'",
                self.index, self.content_type
            ),
            ViolationReason::TooLarge { size, max } => write!(
                f,
                "file {} is too large: {} bytes (max: {} bytes)",
                self.index, size, max
            ),
            ViolationReason::Empty => write!(f, "file {} is empty", self.index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("no files in batch")]
    EmptyBatch,

    #[error("too many files: {count} (max: {max})")]
    TooManyFiles { count: usize, max: usize },

    #[error("{}", describe(.0))]
    Files(Vec<FileViolation>),
}

fn describe(violations: &[FileViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl PolicyViolation {
    /// Per-file violations; empty for batch-level failures.
    pub fn files(&self) -> &[FileViolation] {
        match self {
            PolicyViolation::Files(violations) => violations,
            _ => &[],
        }
    }
}

/// Allow-list of content types plus size and count bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub allowed_types: Vec<String>,
    pub max_bytes: u64,
    pub max_files: usize,
}

impl UploadPolicy {
    pub fn new(allowed_types: Vec<String>, max_bytes: u64, max_files: usize) -> Self {
        Self {
            allowed_types,
            max_bytes,
            max_files,
        }
    }

    /// Policy enforced by the credential issuer.
    pub fn authoritative() -> Self {
        Self::new(default_types(), AUTHORITATIVE_MAX_BYTES, DEFAULT_MAX_FILES)
    }

    /// Advisory policy applied by the client before any network call.
    pub fn preflight() -> Self {
        Self::new(default_types(), PREFLIGHT_MAX_BYTES, DEFAULT_MAX_FILES)
    }

    /// Content types are compared exactly: the issued credential is bound to the
    /// declared string, so `IMAGE/PNG` and `image/png` are different types.
    pub fn allows_type(&self, content_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == content_type)
    }

    /// Check one file. The type check does not depend on the size check.
    pub fn check_file(&self, index: usize, file: &FileDescriptor) -> Option<FileViolation> {
        let reason = if !self.allows_type(&file.content_type) {
            ViolationReason::UnsupportedType
        } else if file.byte_size == 0 {
            ViolationReason::Empty
        } else if file.byte_size > self.max_bytes {
            ViolationReason::TooLarge {
                size: file.byte_size,
                max: self.max_bytes,
            }
        } else {
            return None;
        };

        Some(FileViolation {
            index,
            content_type: file.content_type.clone(),
            reason,
        })
    }

    /// Validate a whole batch. Every offending file is reported, not just the first.
    pub fn validate(&self, batch: &[FileDescriptor]) -> Result<(), PolicyViolation> {
        if batch.is_empty() {
            return Err(PolicyViolation::EmptyBatch);
        }
        if batch.len() > self.max_files {
            return Err(PolicyViolation::TooManyFiles {
                count: batch.len(),
                max: self.max_files,
            });
        }

        let violations: Vec<FileViolation> = batch
            .iter()
            .enumerate()
            .filter_map(|(index, file)| self.check_file(index, file))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(PolicyViolation::Files(violations))
        }
    }

    /// Split a batch into accepted files and refused ones, so a caller can drop the
    /// refused files and show a message for each.
    pub fn partition<'a>(
        &self,
        batch: &'a [FileDescriptor],
    ) -> (Vec<&'a FileDescriptor>, Vec<FileViolation>) {
        let mut accepted = Vec::with_capacity(batch.len());
        let mut refused = Vec::new();
        for (index, file) in batch.iter().enumerate() {
            match self.check_file(index, file) {
                Some(violation) => refused.push(violation),
                None => accepted.push(file),
            }
        }
        (accepted, refused)
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::authoritative()
    }
}

fn default_types() -> Vec<String> {
    DEFAULT_ALLOWED_TYPES.iter().map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(content_type: &str, byte_size: u64) -> FileDescriptor {
        FileDescriptor::new(content_type, byte_size)
    }

    #[test]
    fn accepts_png_under_preflight_bound() {
        let policy = UploadPolicy::preflight();
        assert!(policy.validate(&[file("image/png", 500_000)]).is_ok());
    }

    #[test]
    fn rejects_png_over_preflight_bound() {
        let policy = UploadPolicy::preflight();
        let err = policy.validate(&[file("image/png", 900_000)]).unwrap_err();
        assert_eq!(
            err.files(),
            &[FileViolation {
                index: 0,
                content_type: "image/png".to_string(),
                reason: ViolationReason::TooLarge {
                    size: 900_000,
                    max: 819_200
                },
            }]
        );
    }

    #[test]
    fn unsupported_type_reported_regardless_of_size() {
        let policy = UploadPolicy::authoritative();
        let err = policy
            .validate(&[file("application/zip", 100)])
            .unwrap_err();
        assert_eq!(err.files()[0].reason, ViolationReason::UnsupportedType);

        let err = policy
            .validate(&[file("application/zip", 50 * 1024 * 1024)])
            .unwrap_err();
        assert_eq!(err.files()[0].reason, ViolationReason::UnsupportedType);
    }

    #[test]
    fn one_bad_file_rejects_whole_batch_and_all_are_listed() {
        let policy = UploadPolicy::authoritative();
        let batch = vec![
            file("image/jpeg", 1_000),
            file("text/html", 10),
            file("application/pdf", 0),
            file("image/webp", 2_000),
        ];
        let err = policy.validate(&batch).unwrap_err();
        let indexes: Vec<usize> = err.files().iter().map(|v| v.index).collect();
        assert_eq!(indexes, vec![1, 2]);
        assert_eq!(err.files()[1].reason, ViolationReason::Empty);
    }

    #[test]
    fn content_type_match_is_exact() {
        let policy = UploadPolicy::authoritative();
        assert!(policy.allows_type("image/jpg"));
        assert!(!policy.allows_type("IMAGE/PNG"));
        assert!(!policy.allows_type("image/png; charset=binary"));
    }

    #[test]
    fn size_at_bound_is_accepted() {
        let policy = UploadPolicy::authoritative();
        assert!(policy
            .validate(&[file("application/pdf", AUTHORITATIVE_MAX_BYTES)])
            .is_ok());
        assert!(policy
            .validate(&[file("application/pdf", AUTHORITATIVE_MAX_BYTES + 1)])
            .is_err());
    }

    #[test]
    fn batch_bounds() {
        let policy = UploadPolicy::new(default_types(), 100, 2);
        assert_eq!(policy.validate(&[]), Err(PolicyViolation::EmptyBatch));

        let batch = vec![file("image/png", 1); 3];
        assert_eq!(
            policy.validate(&batch),
            Err(PolicyViolation::TooManyFiles { count: 3, max: 2 })
        );
    }

    #[test]
    fn partition_keeps_good_files() {
        let policy = UploadPolicy::preflight();
        let batch = vec![file("image/png", 10), file("video/mp4", 10)];
        let (accepted, refused) = policy.partition(&batch);
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].content_type, "image/png");
        assert_eq!(refused.len(), 1);
        assert_eq!(refused[0].index, 1);
    }

    #[test]
    fn violation_serializes_with_reason_tag() {
        let violation = FileViolation {
            index: 2,
            content_type: "image/png".to_string(),
            reason: ViolationReason::TooLarge { size: 11, max: 10 },
        };
        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["index"], 2);
        assert_eq!(json["fileType"], "image/png");
        assert_eq!(json["reason"], "too_large");
        assert_eq!(json["max"], 10);
    }

    #[test]
    fn policy_is_deterministic() {
        let policy = UploadPolicy::authoritative();
        let batch = vec![file("image/gif", 5), file("image/png", 5)];
        assert_eq!(policy.validate(&batch), policy.validate(&batch));
    }
}
