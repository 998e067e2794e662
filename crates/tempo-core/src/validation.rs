//! # Input Validation
//!
//! Validation helpers for checkout inputs. Each helper returns a typed
//! [`ValidationError`] so the API layer can map rejections to precise
//! client messages.

use crate::error::ValidationError;
use crate::MAX_ITEM_QUANTITY;

/// Validates a coupon code's format before any lookup happens.
///
/// Codes are 3 to 32 characters of ASCII letters, digits, hyphen, or
/// underscore. Lookup is case-insensitive; codes are stored uppercase.
pub fn validate_coupon_code(code: &str) -> Result<(), ValidationError> {
    let trimmed = code.trim();

    if trimmed.len() < 3 || trimmed.len() > 32 {
        return Err(ValidationError::InvalidCouponCode {
            reason: "code must be 3 to 32 characters".to_string(),
        });
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidCouponCode {
            reason: "code may only contain letters, digits, '-' and '_'".to_string(),
        });
    }

    Ok(())
}

/// Validates an item quantity for cart and checkout operations.
pub fn validate_quantity(quantity: i64) -> Result<(), ValidationError> {
    if quantity < 1 {
        return Err(ValidationError::InvalidQuantity {
            quantity,
            reason: "quantity must be at least 1".to_string(),
        });
    }

    if quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::InvalidQuantity {
            quantity,
            reason: format!("quantity cannot exceed {}", MAX_ITEM_QUANTITY),
        });
    }

    Ok(())
}

/// Minimal email shape check. Real verification happens at signup; this
/// only guards against obviously broken input reaching the database.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let trimmed = email.trim();

    let valid = trimmed.len() >= 5
        && trimmed.len() <= 254
        && trimmed.matches('@').count() == 1
        && !trimmed.starts_with('@')
        && !trimmed.ends_with('@')
        && trimmed.rsplit('@').next().is_some_and(|d| d.contains('.'));

    if !valid {
        return Err(ValidationError::InvalidEmail {
            email: trimmed.to_string(),
        });
    }

    Ok(())
}

/// Rejects negative monetary amounts in client-supplied figures.
pub fn validate_non_negative_amount(field: &str, cents: i64) -> Result<(), ValidationError> {
    if cents < 0 {
        return Err(ValidationError::NegativeAmount {
            field: field.to_string(),
            cents,
        });
    }
    Ok(())
}

/// Validates the shipping address block of a checkout request.
pub fn validate_required_field(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coupon_code_accepts_typical_codes() {
        assert!(validate_coupon_code("SAVE10").is_ok());
        assert!(validate_coupon_code("FREE-SHIP_2026").is_ok());
        assert!(validate_coupon_code("  SAVE10  ").is_ok());
    }

    #[test]
    fn test_coupon_code_rejects_bad_shapes() {
        assert!(validate_coupon_code("AB").is_err());
        assert!(validate_coupon_code(&"X".repeat(33)).is_err());
        assert!(validate_coupon_code("SAVE 10").is_err());
        assert!(validate_coupon_code("SAVE%10").is_err());
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_email_shapes() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@").is_err());
        assert!(validate_email("ana@nodot").is_err());
    }

    #[test]
    fn test_non_negative_amount() {
        assert!(validate_non_negative_amount("subtotal", 0).is_ok());
        assert!(validate_non_negative_amount("subtotal", 100).is_ok());
        assert!(validate_non_negative_amount("subtotal", -1).is_err());
    }

    #[test]
    fn test_required_field() {
        assert!(validate_required_field("city", "Guadalajara").is_ok());
        assert!(validate_required_field("city", "   ").is_err());
    }
}
