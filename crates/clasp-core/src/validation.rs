//! # Validation Module
//!
//! Input rule checks run by the cart reducer and the pricing resolver before
//! any arithmetic happens.
//!
//! ## What Is Validated vs. Clamped
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  REJECTED (ValidationError)          CLAMPED (defined behavior)         │
//! │  ─────────────────────────           ──────────────────────────         │
//! │  quantity ≤ 0 on add                 flat discount > line → $0.00       │
//! │  quantity > 999                      percent discount > 100% → 100%     │
//! │  negative unit price / tip           cart discount > subtotal           │
//! │  price or tip > $1,000,000                                              │
//! │  tax or fee rate > 100%              discount value ≤ 0 → no discount   │
//! │  measured length 0 or > 100in                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Inches, Rate};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_MEASURED_INCHES, MAX_UNIT_PRICE_CENTS};

pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a cart line display name.
///
/// ```rust
/// use clasp_core::validation::validate_item_name;
///
/// assert!(validate_item_name("Figaro Bracelet").is_ok());
/// assert!(validate_item_name("  ").is_err());
/// ```
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity: 1..=999.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an amount (unit prices, tips): 0 to [`MAX_UNIT_PRICE_CENTS`].
///
/// ```rust
/// use clasp_core::money::Money;
/// use clasp_core::validation::validate_amount;
///
/// assert!(validate_amount("tip", Money::from_cents(0)).is_ok());
/// assert!(validate_amount("tip", Money::from_cents(-100)).is_err());
/// ```
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() || amount.cents() > MAX_UNIT_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_UNIT_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a tax or fee rate: 0% to 100%.
pub fn validate_rate(field: &str, rate: Rate) -> ValidationResult<()> {
    if rate > Rate::FULL {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: Rate::FULL.bps() as i64,
        });
    }

    Ok(())
}

/// Validates an operator-measured chain length.
pub fn validate_measured_inches(inches: Inches) -> ValidationResult<()> {
    if inches.is_zero() {
        return Err(ValidationError::MustBePositive {
            field: "measured length".to_string(),
        });
    }

    if inches > MAX_MEASURED_INCHES {
        return Err(ValidationError::OutOfRange {
            field: "measured length (hundredths of an inch)".to_string(),
            min: 1,
            max: MAX_MEASURED_INCHES.hundredths() as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that one more line fits in the cart.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string (cart line ids).
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
