//! Input validation for untrusted data.
//!
//! All user-supplied input MUST be validated before use.
//! This module provides validators for common data types.

use thiserror::Error;

/// Maximum length for user IDs.
pub const MAX_USER_ID_LEN: usize = 64;
/// Maximum length for usernames.
pub const MAX_USERNAME_LEN: usize = 32;
/// Maximum length for artwork titles.
pub const MAX_TITLE_LEN: usize = 100;
/// Maximum objects per drawing.
pub const MAX_OBJECTS_PER_DRAWING: usize = 10_000;

/// Validation error types.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// User ID exceeds maximum length.
    #[error("user_id too long (max {MAX_USER_ID_LEN} chars)")]
    UserIdTooLong,
    /// User ID contains invalid characters.
    #[error("user_id contains invalid characters")]
    UserIdInvalidChars,
    /// Username is empty or exceeds maximum length.
    #[error("username must be 1-{MAX_USERNAME_LEN} chars")]
    UsernameInvalid,
    /// Title exceeds maximum length.
    #[error("title too long (max {MAX_TITLE_LEN} chars)")]
    TitleTooLong,
    /// Too many objects in the drawing.
    #[error("too many objects (max {MAX_OBJECTS_PER_DRAWING})")]
    TooManyObjects,
}

/// Check if a character is valid for IDs (alphanumeric, hyphen, or underscore).
fn is_valid_id_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

/// Validate a user ID.
///
/// Valid user IDs:
/// - 1-64 characters
/// - Alphanumeric, hyphen, underscore only
///
/// # Errors
///
/// Returns [`ValidationError::UserIdTooLong`] if the ID exceeds 64 characters.
/// Returns [`ValidationError::UserIdInvalidChars`] if the ID is empty or contains invalid characters.
pub fn validate_user_id(id: &str) -> Result<(), ValidationError> {
    if id.len() > MAX_USER_ID_LEN {
        return Err(ValidationError::UserIdTooLong);
    }
    if id.is_empty() || !id.chars().all(is_valid_id_char) {
        return Err(ValidationError::UserIdInvalidChars);
    }
    Ok(())
}

/// Validate a username.
///
/// # Errors
///
/// Returns [`ValidationError::UsernameInvalid`] if the name is empty or
/// exceeds 32 characters.
pub fn validate_username(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || name.chars().count() > MAX_USERNAME_LEN {
        return Err(ValidationError::UsernameInvalid);
    }
    Ok(())
}

/// Validate an artwork title.
///
/// Empty titles are allowed; the caller substitutes a default.
///
/// # Errors
///
/// Returns [`ValidationError::TitleTooLong`] if the title exceeds 100
/// characters.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(())
}

/// Validate the object count of a drawing.
///
/// # Errors
///
/// Returns [`ValidationError::TooManyObjects`] if the count exceeds the
/// limit.
pub fn validate_object_count(count: usize) -> Result<(), ValidationError> {
    if count > MAX_OBJECTS_PER_DRAWING {
        return Err(ValidationError::TooManyObjects);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_user_ids() {
        assert!(validate_user_id("user-1").is_ok());
        assert!(validate_user_id("user_abc123").is_ok());
        assert!(validate_user_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
    }

    #[test]
    fn test_invalid_user_ids() {
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("has spaces").is_err());
        assert!(validate_user_id("../../../etc/passwd").is_err());
        assert!(validate_user_id(&"x".repeat(100)).is_err());
    }

    #[test]
    fn test_user_id_boundary() {
        assert!(validate_user_id(&"x".repeat(MAX_USER_ID_LEN)).is_ok());
        assert!(validate_user_id(&"x".repeat(MAX_USER_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_username_bounds() {
        assert!(validate_username("Ada").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"x".repeat(MAX_USERNAME_LEN)).is_ok());
        assert!(validate_username(&"x".repeat(MAX_USERNAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_title_bounds() {
        assert!(validate_title("").is_ok());
        assert!(validate_title("Untitled Masterpiece").is_ok());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN)).is_ok());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN + 1)).is_err());
    }

    #[test]
    fn test_object_count_bounds() {
        assert!(validate_object_count(0).is_ok());
        assert!(validate_object_count(MAX_OBJECTS_PER_DRAWING).is_ok());
        assert!(validate_object_count(MAX_OBJECTS_PER_DRAWING + 1).is_err());
    }
}
