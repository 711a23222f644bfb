//! # Error Types
//!
//! Domain-specific error types for karat-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  karat-core errors (this file)                                         │
//! │  ├── CoreError        - Allocation rejections and domain rules         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  karat-db errors (separate crate)                                      │
//! │  ├── DbError          - Persistence failures                           │
//! │  └── LedgerError      - What callers of the facade see                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → Form message        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every rejection carries the metal key and the weights involved, so a
//! form can say exactly what was missing without recomputing anything.

use thiserror::Error;

use crate::metal::MetalKey;
use crate::types::StockEntryStatus;
use crate::weight::Weight;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger rule violations and allocation rejections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A stock entry was committed without a purchase invoice.
    #[error("Stock entry has no purchase invoice")]
    MissingInvoice,

    /// The referenced purchase invoice does not exist.
    #[error("Purchase invoice {invoice_id} not found")]
    UnknownInvoice { invoice_id: String },

    /// No catalog item has this code.
    #[error("No catalog item with code {item_code}")]
    UnknownItem { item_code: String },

    /// The item exists but has been taken out of the catalog.
    #[error("Item {item_code} is deactivated")]
    InactiveItem { item_code: String },

    /// No committed stock entry carries this number.
    #[error("Stock entry {entry_number} not found")]
    UnknownEntry { entry_number: String },

    /// The draft targets a different invoice than the one being checked.
    #[error("Stock entry targets invoice {found}, not {expected}")]
    InvoiceMismatch { expected: String, found: String },

    /// A stock entry was committed without any lines.
    #[error("Stock entry has no items")]
    EmptyEntry,

    /// The item's metal key was never received on the invoice.
    ///
    /// ## When This Occurs
    /// - Silver item picked against a gold-only invoice
    /// - Gold 18 item picked against a Gold 22 invoice
    ///
    /// Quantity is irrelevant: no amount of this metal exists here.
    #[error("No {key} metal on this invoice for item {item_code}")]
    NoMatchingMetal { item_code: String, key: MetalKey },

    /// The key exists on the invoice but not enough of it remains.
    ///
    /// ## User Workflow
    /// ```text
    /// Add line: Ring-A × 11 (5 g each)
    ///      │
    ///      ▼
    /// required = 55 g, available[Gold 22] = 50 g
    ///      │
    ///      ▼
    /// InsufficientMetal { required: 55 g, available: 50 g, shortfall: 5 g }
    ///      │
    ///      ▼
    /// Form shows: "Short by 5.000 g of Gold 22"
    /// ```
    #[error(
        "Insufficient {key} for item {item_code}: required {required}, available {available}, short by {shortfall}"
    )]
    InsufficientMetal {
        item_code: String,
        key: MetalKey,
        required: Weight,
        available: Weight,
        shortfall: Weight,
    },

    /// One line of a multi-line entry failed; the whole entry is rejected.
    #[error("Line {line} rejected: {source}")]
    LineRejected {
        /// Zero-based index of the failing line.
        line: usize,
        #[source]
        source: Box<CoreError>,
    },

    /// A status transition was requested on an entry that does not allow it.
    #[error("Stock entry {entry_number} is {status:?}, cannot perform operation")]
    EntryNotActive {
        entry_number: String,
        status: StockEntryStatus,
    },

    /// Draft has reached the maximum number of lines.
    #[error("Stock entry cannot have more than {max} lines")]
    TooManyLines { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns the innermost rejection, unwrapping `LineRejected`.
    pub fn root(&self) -> &CoreError {
        match self {
            CoreError::LineRejected { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns the shortfall when this is (or wraps) an `InsufficientMetal`.
    pub fn shortfall(&self) -> Option<Weight> {
        match self.root() {
            CoreError::InsufficientMetal { shortfall, .. } => Some(*shortfall),
            _ => None,
        }
    }

    /// True for rejections caused by the invoice's metal balance, as opposed
    /// to malformed input.
    pub fn is_allocation_rejection(&self) -> bool {
        matches!(
            self.root(),
            CoreError::NoMatchingMetal { .. } | CoreError::InsufficientMetal { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised at the collaborator boundary, before any ledger logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., unparsable purity or weight).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metal::normalize;
    use rust_decimal_macros::dec;

    fn gold_22() -> MetalKey {
        normalize("Gold", dec!(22.00))
    }

    #[test]
    fn test_insufficient_metal_message() {
        let err = CoreError::InsufficientMetal {
            item_code: "RING-A".to_string(),
            key: gold_22(),
            required: Weight::from_grams(55),
            available: Weight::from_grams(50),
            shortfall: Weight::from_grams(5),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient Gold 22 for item RING-A: required 55.000 g, available 50.000 g, short by 5.000 g"
        );
    }

    #[test]
    fn test_no_matching_metal_message() {
        let err = CoreError::NoMatchingMetal {
            item_code: "CHAIN-B".to_string(),
            key: normalize("Silver", dec!(92.5)),
        };
        assert_eq!(
            err.to_string(),
            "No Silver 92.5 metal on this invoice for item CHAIN-B"
        );
    }

    #[test]
    fn test_root_and_shortfall_through_line_rejection() {
        let inner = CoreError::InsufficientMetal {
            item_code: "RING-A".to_string(),
            key: gold_22(),
            required: Weight::from_grams(55),
            available: Weight::from_grams(50),
            shortfall: Weight::from_grams(5),
        };
        let wrapped = CoreError::LineRejected {
            line: 2,
            source: Box::new(inner.clone()),
        };

        assert_eq!(wrapped.root(), &inner);
        assert_eq!(wrapped.shortfall(), Some(Weight::from_grams(5)));
        assert!(wrapped.is_allocation_rejection());
        assert!(wrapped.to_string().starts_with("Line 2 rejected: "));
    }

    #[test]
    fn test_unknown_references_are_not_allocation_rejections() {
        let err = CoreError::UnknownInvoice {
            invoice_id: "no-such-invoice".to_string(),
        };
        assert_eq!(err.to_string(), "Purchase invoice no-such-invoice not found");
        assert!(!err.is_allocation_rejection());

        let err = CoreError::InactiveItem {
            item_code: "RING-A".to_string(),
        };
        assert!(!err.is_allocation_rejection());
        assert_eq!(err.shortfall(), None);
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.is_allocation_rejection());
        assert_eq!(core_err.shortfall(), None);
    }
}
