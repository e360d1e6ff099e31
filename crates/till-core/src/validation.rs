//! # Validation Module
//!
//! Request shape validation for Till POS.
//!
//! These checks run before any business logic: they reject malformed input
//! (empty email, zero quantity, negative tender count) so the billing
//! pipeline only ever sees well-formed requests. Business rules (stock
//! sufficiency, payment coverage, change feasibility) are NOT here; they
//! belong to the transaction pipeline, which needs drawer and inventory
//! state to decide them.
//!
//! ## Usage
//! ```rust
//! use till_core::validation::{validate_email, validate_quantity};
//!
//! validate_email("jane@example.com").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::{BillRequest, TenderEntry};
use crate::{
    MAX_BILL_LINES, MAX_DENOMINATION_VALUE, MAX_LINE_QUANTITY, MAX_TENDER_COUNT,
    MAX_TENDER_ENTRIES,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a customer email address.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 255 characters
/// - Must contain exactly one `@` with text on both sides
///
/// Deliberately shallow: full RFC 5322 parsing buys nothing here, the
/// address is only a customer key and a notification target.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "customer_email".to_string(),
        });
    }

    if email.len() > 255 {
        return Err(ValidationError::TooLong {
            field: "customer_email".to_string(),
            max: 255,
        });
    }

    let mut parts = email.split('@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() || parts.next().is_some() {
        return Err(ValidationError::InvalidFormat {
            field: "customer_email".to_string(),
            reason: "must look like name@domain".to_string(),
        });
    }

    Ok(())
}

/// Validates a business product id.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
pub fn validate_product_id(product_id: &str) -> ValidationResult<()> {
    let product_id = product_id.trim();

    if product_id.is_empty() {
        return Err(ValidationError::Required {
            field: "product_id".to_string(),
        });
    }

    if product_id.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "product_id".to_string(),
            max: 50,
        });
    }

    if !product_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "product_id".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 255 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 255,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (free items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > crate::types::TaxRate::MAX_BPS {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: crate::types::TaxRate::MAX_BPS as i64,
        });
    }

    Ok(())
}

/// Validates a denomination face value.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed MAX_DENOMINATION_VALUE (guards against typo values
///   that would make tender sums overflow-prone)
pub fn validate_denomination_value(value: i64) -> ValidationResult<()> {
    if value <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "denomination value".to_string(),
        });
    }

    if value > MAX_DENOMINATION_VALUE {
        return Err(ValidationError::OutOfRange {
            field: "denomination value".to_string(),
            min: 1,
            max: MAX_DENOMINATION_VALUE,
        });
    }

    Ok(())
}

/// Validates a denomination count (drawer supply or tender count).
pub fn validate_denomination_count(count: i64) -> ValidationResult<()> {
    if count < 0 {
        return Err(ValidationError::OutOfRange {
            field: "denomination count".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates one tender entry: positive value, count in 1..=MAX_TENDER_COUNT.
///
/// The count cap matters: it is what keeps `tendered_sum_cents()` inside
/// i64 (worst case MAX_TENDER_ENTRIES × MAX_DENOMINATION_VALUE ×
/// MAX_TENDER_COUNT × 100 = 10^13 cents).
pub fn validate_tender_entry(entry: &TenderEntry) -> ValidationResult<()> {
    validate_denomination_value(entry.value)?;

    if entry.count <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "tender count".to_string(),
        });
    }

    if entry.count > MAX_TENDER_COUNT {
        return Err(ValidationError::OutOfRange {
            field: "tender count".to_string(),
            min: 1,
            max: MAX_TENDER_COUNT,
        });
    }

    Ok(())
}

/// Validates the shape of a whole bill request.
///
/// Checks only what can be decided without touching inventory or drawer
/// state. Covers:
/// - customer email format
/// - at least one cart line, at most MAX_BILL_LINES
/// - every line: valid product id, valid quantity
/// - at most MAX_TENDER_ENTRIES tender entries, each with a positive value
///   and a count in 1..=MAX_TENDER_COUNT (so the tender sum cannot
///   overflow)
/// - declared paid amount non-negative
pub fn validate_bill_request(request: &BillRequest) -> ValidationResult<()> {
    validate_email(&request.customer_email)?;

    if request.lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    if request.lines.len() > MAX_BILL_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_BILL_LINES as i64,
        });
    }

    for line in &request.lines {
        validate_product_id(&line.product_id)?;
        validate_quantity(line.quantity)?;
    }

    if request.tender.len() > MAX_TENDER_ENTRIES {
        return Err(ValidationError::OutOfRange {
            field: "tender".to_string(),
            min: 0,
            max: MAX_TENDER_ENTRIES as i64,
        });
    }

    for entry in &request.tender {
        validate_tender_entry(entry)?;
    }

    if request.paid_cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "paid_amount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
