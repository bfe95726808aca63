//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! SQLite TEXT has no built-in length enforcement, so every handler that
//! persists free text checks it here first.

use crate::utils::AppError;
use shared::models::PostalAddress;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product title, category, shop name, person names
pub const MAX_NAME_LEN: usize = 200;

/// Notes, reasons, review comments (order note, cancel reason, etc.)
pub const MAX_NOTE_LEN: usize = 500;

/// Long descriptions: product and shop descriptions
pub const MAX_DESCRIPTION_LEN: usize = 5000;

/// Short identifiers: phone, sku, coupon code, tracking number, etc.
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// Shortest accepted password
pub const MIN_PASSWORD_LEN: usize = 6;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

/// Chat message body
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Attachments per chat message
pub const MAX_ATTACHMENTS: usize = 10;

// ── Validation helpers (CRUD handlers) ──────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Minimal shape check: one `@`, non-empty local part, dotted domain
pub fn validate_email(email: &str) -> Result<(), AppError> {
    validate_required_text(email, "email", MAX_EMAIL_LEN)?;
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(AppError::validation("Please provide a valid email"));
    }
    Ok(())
}

/// Password length window, checked before hashing
pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation("password is too long"));
    }
    Ok(())
}

/// Required fields of a shipping/billing address
pub fn validate_address(address: &PostalAddress) -> Result<(), AppError> {
    validate_required_text(&address.full_name, "full_name", MAX_NAME_LEN)?;
    validate_required_text(&address.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&address.address_line1, "address_line1", MAX_ADDRESS_LEN)?;
    validate_optional_text(&address.address_line2, "address_line2", MAX_ADDRESS_LEN)?;
    validate_required_text(&address.city, "city", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&address.state, "state", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&address.postal_code, "postal_code", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&address.country, "country", MAX_SHORT_TEXT_LEN)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Mug", "title", MAX_NAME_LEN).is_ok());
        assert!(validate_required_text("   ", "title", MAX_NAME_LEN).is_err());
        assert!(validate_required_text(&"x".repeat(MAX_NAME_LEN + 1), "title", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "note", MAX_NOTE_LEN).is_ok());
        assert!(validate_optional_text(&Some("x".repeat(MAX_NOTE_LEN + 1)), "note", MAX_NOTE_LEN).is_err());
    }

    #[test]
    fn test_email_shape() {
        assert!(validate_email("buyer@example.com").is_ok());
        assert!(validate_email("buyer@localhost").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_password_length_window() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_LEN + 1)).is_err());
    }
}
