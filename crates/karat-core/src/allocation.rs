//! # Allocation Validation
//!
//! Decides whether an invoice still holds enough metal for a line.
//!
//! ## Algorithm
//! ```text
//! validate(invoice, item, quantity)
//!      │
//!      ├── quantity <= 0?              → Validation(MustBePositive)
//!      │
//!      ├── required = net_weight × quantity
//!      ├── key      = normalize(item.metal_type, item.purity)
//!      ├── available = available_by_key(invoice)   (recomputed, never cached)
//!      │
//!      ├── key not in available?        → NoMatchingMetal
//!      ├── available[key] < required?   → InsufficientMetal { shortfall }
//!      │
//!      └── Ok(available[key] − required)   (nothing is persisted)
//! ```
//!
//! Nothing in this module touches storage. The commit path in karat-db
//! runs the same checks inside its transaction.

use crate::draft::DraftStockEntry;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ledger::{InvoiceLedger, MetalMap};
use crate::metal::MetalKey;
use crate::types::{JewelryItem, PurchaseInvoice, StockEntryMaster};
use crate::validation::validate_quantity;
use crate::weight::Weight;

/// Outcome of a successful whole-draft check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationSummary {
    /// Weight the draft consumes, per key.
    pub required: MetalMap,
    /// What each key would have left after commit.
    pub remaining: MetalMap,
}

/// Takes `net_weight × quantity` out of `available[key]`, or explains why not.
fn allocate(
    available: &mut MetalMap,
    item_code: &str,
    key: MetalKey,
    net_weight: Weight,
    quantity: i64,
) -> CoreResult<Weight> {
    validate_quantity(quantity)?;

    let required = net_weight
        .checked_mul_quantity(quantity)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: i64::MAX / net_weight.milligrams().max(1),
        })?;

    let Some(pool) = available.get_mut(&key) else {
        return Err(CoreError::NoMatchingMetal {
            item_code: item_code.to_string(),
            key,
        });
    };

    if *pool < required {
        return Err(CoreError::InsufficientMetal {
            item_code: item_code.to_string(),
            key,
            required,
            available: *pool,
            shortfall: required - *pool,
        });
    }

    *pool -= required;
    Ok(*pool)
}

/// Checks one line against a precomputed availability map.
///
/// Returns the weight that would remain on the item's key.
pub fn validate_against(available: &MetalMap, item: &JewelryItem, quantity: i64) -> CoreResult<Weight> {
    let key = item.key();
    let mut pool = MetalMap::new();
    if let Some(weight) = available.get(&key) {
        pool.insert(key.clone(), *weight);
    }
    allocate(&mut pool, &item.item_code, key, item.net_weight, quantity)
}

impl InvoiceLedger<'_> {
    /// Validates one candidate line against current availability.
    pub fn validate(&self, item: &JewelryItem, quantity: i64) -> CoreResult<Weight> {
        validate_against(&self.available_by_key(), item, quantity)
    }

    /// Availability after the draft's pending lines are taken out.
    pub fn available_after_draft(&self, draft: &DraftStockEntry) -> MetalMap {
        let mut available = self.available_by_key();
        for (key, required) in draft.required_by_key() {
            if let Some(pool) = available.get_mut(&key) {
                *pool -= required;
            }
        }
        available
    }

    /// Validates a candidate line as if the draft's earlier lines were
    /// already committed.
    pub fn validate_with_draft(
        &self,
        draft: &DraftStockEntry,
        item: &JewelryItem,
        quantity: i64,
    ) -> CoreResult<Weight> {
        validate_against(&self.available_after_draft(draft), item, quantity)
    }

    /// Validates a whole draft, line by line, against a running balance.
    ///
    /// Lines are cumulative: two lines on the same key must fit together.
    /// The first failing line rejects the draft.
    pub fn validate_draft(&self, draft: &DraftStockEntry) -> CoreResult<AllocationSummary> {
        let invoice_id = draft.invoice_id.as_deref().ok_or(CoreError::MissingInvoice)?;
        if invoice_id != self.invoice().id {
            return Err(CoreError::InvoiceMismatch {
                expected: self.invoice().id.clone(),
                found: invoice_id.to_string(),
            });
        }
        if draft.is_empty() {
            return Err(CoreError::EmptyEntry);
        }

        let mut remaining = self.available_by_key();
        for (index, line) in draft.lines.iter().enumerate() {
            allocate(
                &mut remaining,
                &line.item_code,
                line.key(),
                line.net_weight,
                line.quantity,
            )
            .map_err(|source| CoreError::LineRejected {
                line: index,
                source: Box::new(source),
            })?;
        }

        let required = draft.required_by_key();
        remaining.retain(|key, _| required.contains_key(key));
        Ok(AllocationSummary {
            required,
            remaining,
        })
    }
}

// =============================================================================
// Picker Filters
// =============================================================================

/// Active catalog items whose metal key the invoice received.
pub fn items_matching<'c>(available: &MetalMap, catalog: &'c [JewelryItem]) -> Vec<&'c JewelryItem> {
    catalog
        .iter()
        .filter(|item| item.is_active && available.contains_key(&item.key()))
        .collect()
}

/// Invoices with metal left on at least one key.
pub fn invoices_with_available<'i>(
    invoices: &'i [PurchaseInvoice],
    entries: &[StockEntryMaster],
) -> Vec<&'i PurchaseInvoice> {
    invoices
        .iter()
        .filter(|invoice| InvoiceLedger::new(invoice, entries).has_any_available())
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
