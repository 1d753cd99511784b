//! Docket Storage Library
//!
//! Object storage for direct uploads: storage key generation, SigV4 presigned `PUT`
//! grants and the backends that honour them.
//!
//! # Storage key format
//!
//! Every uploaded object lives under its owner's prefix:
//!
//! - `uploads/{identity}/{token}-{subtype}`
//!
//! where `token` is 64 hex characters from the thread CSPRNG. Keys never contain
//! client file names. Key generation is centralized in the `keys` module.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-memory")]
pub mod memory;
pub mod presign;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use docket_core::StorageBackend;
pub use factory::{create_storage, StorageHandles};
pub use keys::{is_owned_by, next_key, owner_prefix};
#[cfg(feature = "storage-memory")]
pub use memory::MemoryStorage;
pub use presign::{GrantError, PresignedPut, SigV4Presigner, SigningCredentials};
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult, UploadSigner};
