//! # Validation Module
//!
//! Input checks run before anything touches stock.
//!
//! ## Where Each Check Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_required   recipe name, production output name               │
//! │  validate_sku        explicit production output SKU                     │
//! │  validate_identifier sale ids (they name receipt files)                 │
//! │  validate_quantity   cart lines, production inputs                      │
//! │  validate_amount     cash tendered, final prices                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ledger writes do NOT use these: a blank SKU on `upsert` is a silent
//! no-op and negative numbers are clamped, matching how spreadsheet
//! imports behave.

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Rejects blank text.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Validates a SKU.
///
/// ## Rules
/// - Must not be blank
/// - At most 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use papeleria_core::validation::validate_sku;
///
/// assert!(validate_sku("CU-008").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("CU 008").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    validate_identifier("sku", sku)
}

/// Same rules as [`validate_sku`], reported against `field`.
pub fn validate_identifier(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();
    validate_required(field, value)?;

    if value.chars().count() > 50 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 50,
        });
    }

    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Quantities must be finite and strictly positive.
pub fn validate_quantity(field: &str, qty: f64) -> ValidationResult<()> {
    if !qty.is_finite() || qty <= 0.0 {
        return Err(ValidationError::must_be_positive(field));
    }
    Ok(())
}

/// Amounts must be finite and not negative.
pub fn validate_amount(field: &str, amount: f64) -> ValidationResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required() {
        assert!(validate_required("name", "Llavero").is_ok());
        assert!(matches!(
            validate_required("name", "  "),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("LAP_HB-2").is_ok());
        assert!(validate_sku(&"A".repeat(51)).is_err());
        assert!(validate_sku("LAP/HB").is_err());
    }

    #[test]
    fn test_validate_identifier_names_field() {
        assert!(validate_identifier("sale id", "3f9a0c1b").is_ok());
        assert_eq!(
            validate_identifier("sale id", "a/b"),
            Err(ValidationError::InvalidFormat {
                field: "sale id".to_string(),
                reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
            })
        );
        assert!(matches!(
            validate_identifier("sale id", "../x"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity("qty", 0.25).is_ok());
        assert!(validate_quantity("qty", 0.0).is_err());
        assert!(validate_quantity("qty", -1.0).is_err());
        assert!(validate_quantity("qty", f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("price", 0.0).is_ok());
        assert!(validate_amount("price", -0.01).is_err());
        assert!(validate_amount("price", f64::NAN).is_err());
    }
}
