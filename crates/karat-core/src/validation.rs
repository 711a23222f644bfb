//! # Validation Module
//!
//! Input validation at the collaborator boundary.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Forms                                                        │
//! │  └── Text fields → THIS MODULE (parse purity, parse weight, codes)     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Ledger (allocation module)                                   │
//! │  └── Metal matching, availability, shortfall                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (gross_weight_mg >= 0, quantity > 0)                        │
//! │  └── UNIQUE (item_code, invoice_number, entry_number)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The normalizer never sees a string: purity text is turned into a
//! `Decimal` here, and a bad value is the caller's validation error.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::types::{JewelryItem, MetalReceiptLine};
use crate::weight::Weight;
use crate::{MAX_LINE_QUANTITY, MAX_WEIGHT_MG};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn validate_code(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '/')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, underscores, and slashes"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a catalog item code.
///
/// ```rust
/// use karat_core::validation::validate_item_code;
///
/// assert!(validate_item_code("RING-22-001").is_ok());
/// assert!(validate_item_code("").is_err());
/// assert!(validate_item_code("has space").is_err());
/// ```
pub fn validate_item_code(code: &str) -> ValidationResult<()> {
    validate_code("item_code", code, 50)
}

/// Validates a supplier invoice number.
pub fn validate_invoice_number(number: &str) -> ValidationResult<()> {
    validate_code("invoice_number", number, 50)
}

/// Validates a metal type name (e.g. `Gold`, `Silver`).
pub fn validate_metal_type(metal_type: &str) -> ValidationResult<()> {
    let metal_type = metal_type.trim();

    if metal_type.is_empty() {
        return Err(ValidationError::Required {
            field: "metal_type".to_string(),
        });
    }

    if metal_type.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "metal_type".to_string(),
            max: 50,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Parses a purity typed into a form.
///
/// ## Rules
/// - Must be a decimal number (`22`, `22.00`, `92.5`)
/// - Must be greater than 0 and at most 100 (karat/fineness scales both fit)
///
/// ```rust
/// use karat_core::validation::parse_purity;
///
/// assert_eq!(parse_purity("22.00").unwrap().to_string(), "22.00");
/// assert!(parse_purity("22k").is_err());
/// ```
pub fn parse_purity(input: &str) -> ValidationResult<Decimal> {
    let purity = Decimal::from_str(input.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: "purity".to_string(),
        reason: "must be a decimal number".to_string(),
    })?;

    validate_purity(purity)?;
    Ok(purity)
}

/// Validates an already-parsed purity.
pub fn validate_purity(purity: Decimal) -> ValidationResult<()> {
    if purity <= Decimal::ZERO || purity > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: "purity".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates a line quantity.
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

/// Rejects weights above [`MAX_WEIGHT_MG`].
fn validate_weight_bound(field: &str, weight: Weight) -> ValidationResult<()> {
    if weight.milligrams() > MAX_WEIGHT_MG {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_WEIGHT_MG,
        });
    }

    Ok(())
}

/// Validates a receipt line before an invoice is stored.
///
/// Receipt weights may be zero (placeholder lines) but never negative.
pub fn validate_receipt_line(line: &MetalReceiptLine) -> ValidationResult<()> {
    validate_metal_type(&line.metal_type)?;
    validate_purity(line.purity)?;

    if line.gross_weight.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "gross_weight".to_string(),
        });
    }
    validate_weight_bound("gross_weight", line.gross_weight)
}

/// Validates a catalog item before it is stored.
pub fn validate_item(item: &JewelryItem) -> ValidationResult<()> {
    validate_item_code(&item.item_code)?;
    validate_metal_type(&item.metal_type)?;
    validate_purity(item.purity)?;

    if item.name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if !item.net_weight.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "net_weight".to_string(),
        });
    }
    validate_weight_bound("net_weight", item.net_weight)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_item_code() {
        assert!(validate_item_code("RING-A").is_ok());
        assert!(validate_item_code("BNG_22/7").is_ok());

        assert!(validate_item_code("").is_err());
        assert!(validate_item_code("   ").is_err());
        assert!(validate_item_code("ring a").is_err());
        assert!(validate_item_code(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_parse_purity() {
        assert_eq!(parse_purity("22").unwrap(), dec!(22));
        assert_eq!(parse_purity(" 92.5 ").unwrap(), dec!(92.5));
        assert_eq!(parse_purity("22.00").unwrap(), dec!(22));

        assert!(parse_purity("").is_err());
        assert!(parse_purity("22k").is_err());
        assert!(parse_purity("0").is_err());
        assert!(parse_purity("-1").is_err());
        assert!(parse_purity("100.5").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_receipt_line() {
        let ok = MetalReceiptLine::new("Gold", dec!(22), Weight::from_grams(100));
        assert!(validate_receipt_line(&ok).is_ok());

        let zero = MetalReceiptLine::new("Gold", dec!(22), Weight::zero());
        assert!(validate_receipt_line(&zero).is_ok());

        let negative = MetalReceiptLine::new("Gold", dec!(22), Weight::from_milligrams(-1));
        assert_eq!(
            validate_receipt_line(&negative),
            Err(ValidationError::MustNotBeNegative {
                field: "gross_weight".to_string()
            })
        );

        let no_metal = MetalReceiptLine::new(" ", dec!(22), Weight::from_grams(1));
        assert!(validate_receipt_line(&no_metal).is_err());

        let at_bound = Weight::from_milligrams(MAX_WEIGHT_MG);
        let at_bound = MetalReceiptLine::new("Gold", dec!(22), at_bound);
        assert!(validate_receipt_line(&at_bound).is_ok());

        let huge = Weight::from_milligrams(i64::MAX / 2 + 1);
        let huge = MetalReceiptLine::new("Gold", dec!(22), huge);
        assert_eq!(
            validate_receipt_line(&huge),
            Err(ValidationError::OutOfRange {
                field: "gross_weight".to_string(),
                min: 0,
                max: MAX_WEIGHT_MG,
            })
        );
    }

    #[test]
    fn test_validate_item() {
        let ring = JewelryItem::new("RING-A", "Plain band", "Gold", dec!(22), Weight::from_grams(5));
        assert!(validate_item(&ring).is_ok());

        let weightless = JewelryItem::new("RING-B", "Band", "Gold", dec!(22), Weight::zero());
        assert_eq!(
            validate_item(&weightless),
            Err(ValidationError::MustBePositive {
                field: "net_weight".to_string()
            })
        );

        let bad_purity = JewelryItem::new("RING-C", "Band", "Gold", dec!(0), Weight::from_grams(1));
        assert!(validate_item(&bad_purity).is_err());

        let bad_code = JewelryItem::new("RING C", "Band", "Gold", dec!(22), Weight::from_grams(1));
        assert!(validate_item(&bad_code).is_err());

        let too_heavy = JewelryItem::new(
            "RING-D",
            "Band",
            "Gold",
            dec!(22),
            Weight::from_milligrams(MAX_WEIGHT_MG + 1),
        );
        assert!(matches!(
            validate_item(&too_heavy),
            Err(ValidationError::OutOfRange { .. })
        ));
    }
}
