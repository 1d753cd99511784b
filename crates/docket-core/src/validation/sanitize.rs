//! Sanitization of free-text submission fields before they are persisted.

/// Maximum length for the optional submission note (characters).
pub const MAX_NOTE_LENGTH: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be a positive number")]
    NotPositive { field: &'static str },

    #[error("{field} is out of range")]
    OutOfRange { field: &'static str },
}

/// Reduce text to letters, digits, spaces, `-` and `_`, trimmed and truncated.
pub fn sanitize_text(input: &str, max_len: usize) -> String {
    input
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .chars()
        .take(max_len)
        .collect()
}

/// Largest accepted numeric field value (fits a Postgres `INTEGER`).
pub const MAX_FIELD_VALUE: u32 = i32::MAX as u32;

/// Parse a numeric form field as a positive integer. Only ASCII digits are accepted
/// once surrounding whitespace is trimmed; signs, separators and exponents are refused.
pub fn parse_positive(field: &'static str, input: &str) -> Result<u32, FieldError> {
    let digits = input.trim();
    if digits.is_empty() {
        return Err(FieldError::Missing { field });
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::NotPositive { field });
    }
    let value: u32 = digits
        .parse()
        .map_err(|_| FieldError::OutOfRange { field })?;
    if value == 0 {
        return Err(FieldError::NotPositive { field });
    }
    if value > MAX_FIELD_VALUE {
        return Err(FieldError::OutOfRange { field });
    }
    Ok(value)
}
