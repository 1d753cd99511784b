//! Storage key generation.
//!
//! Key format: `uploads/{identity}/{64 hex chars}-{subtype}`. The token carries
//! 256 bits from the thread CSPRNG, so keys are unguessable and never collide in
//! practice. All backends and the recorder's ownership check use this module.

use crate::traits::{StorageError, StorageResult};
use rand::RngCore;

/// Root prefix for user uploads.
pub const UPLOAD_PREFIX: &str = "uploads";

const TOKEN_BYTES: usize = 32;
const FALLBACK_SUBTYPE: &str = "bin";

/// Prefix owned by `identity`, including the trailing slash.
pub fn owner_prefix(identity: &str) -> String {
    format!("{}/{}/", UPLOAD_PREFIX, identity)
}

/// Generate a fresh storage key for `identity` and the declared content type.
pub fn next_key(identity: &str, content_type: &str) -> StorageResult<String> {
    validate_identity(identity)?;

    let mut token = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut token);

    Ok(format!(
        "{}{}-{}",
        owner_prefix(identity),
        hex::encode(token),
        subtype_suffix(content_type)
    ))
}

/// True when `key` is a single object directly under `identity`'s prefix.
pub fn is_owned_by(key: &str, identity: &str) -> bool {
    if validate_identity(identity).is_err() {
        return false;
    }
    match key.strip_prefix(&owner_prefix(identity)) {
        Some(rest) => !rest.is_empty() && !rest.contains('/') && !rest.contains(".."),
        None => false,
    }
}

/// `image/png` -> `png`, `application/pdf; q=1` -> `pdf`. Only `[a-z0-9]` survive.
fn subtype_suffix(content_type: &str) -> String {
    let subtype: String = content_type
        .split(';')
        .next()
        .and_then(|essence| essence.split('/').nth(1))
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if subtype.is_empty() {
        FALLBACK_SUBTYPE.to_string()
    } else {
        subtype
    }
}

/// The identity becomes one path segment; anything that could escape it is refused.
fn validate_identity(identity: &str) -> StorageResult<()> {
    if identity.is_empty()
        || identity.contains('/')
        || identity.contains('\\')
        || identity.contains("..")
        || identity.chars().any(char::is_control)
    {
        return Err(StorageError::InvalidKey(format!(
            "identity '{}' cannot be used as a key segment",
            identity.escape_debug()
        )));
    }
    Ok(())
}
