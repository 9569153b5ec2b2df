//! Validation helpers for ledger inputs
//!
//! These run before any state is touched; the backend maps failures into
//! field-level validation errors.

use rust_decimal::Decimal;

/// Longest accepted PO/SO reference number.
pub const MAX_REFERENCE_LEN: usize = 64;

/// Longest accepted product name.
pub const MAX_NAME_LEN: usize = 200;

/// A movement or plan quantity must be strictly positive.
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// A product name must be non-empty and of sensible length.
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty");
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err("Name is too long");
    }
    Ok(())
}

/// A PO/SO reference number must be non-empty and short.
pub fn validate_reference(reference: &str) -> Result<(), &'static str> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Err("Reference number cannot be empty");
    }
    if trimmed.len() > MAX_REFERENCE_LEN {
        return Err("Reference number is too long");
    }
    Ok(())
}
