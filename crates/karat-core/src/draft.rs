//! # Draft Stock Entry
//!
//! The stock entry being authored. It lives only in memory until commit.
//!
//! ## Authoring Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Draft Operations                                     │
//! │                                                                         │
//! │  Form Action              Draft Method            Draft Change          │
//! │  ───────────              ────────────            ────────────          │
//! │                                                                         │
//! │  Pick invoice ──────────► (opened by karat-db) ─► invoice_id, number   │
//! │                                                                         │
//! │  Add item line ─────────► add_line() ───────────► lines.push(snapshot) │
//! │                                                                         │
//! │  Remove line ───────────► remove_line() ────────► lines.remove(i)      │
//! │                                                                         │
//! │  Save ──────────────────► commit (karat-db) ────► StockEntryMaster     │
//! │                                                                         │
//! │  Line-level metal checks happen in the ledger, against availability    │
//! │  minus this draft's pending lines.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::ledger::MetalMap;
use crate::types::{JewelryItem, StockEntryLine};
use crate::validation::validate_quantity;
use crate::weight::Weight;
use crate::MAX_ENTRY_LINES;

/// A stock entry that has not been committed yet.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DraftStockEntry {
    /// Reserved when the draft was opened.
    pub entry_number: String,

    /// Target invoice; `None` until the user picks one.
    pub invoice_id: Option<String>,

    /// Invoice revision seen when the invoice was picked.
    ///
    /// If commit-time validation fails and the invoice has moved past this
    /// revision, another session consumed the metal first.
    pub observed_revision: Option<i64>,

    pub lines: Vec<StockEntryLine>,

    pub notes: Option<String>,
}

impl DraftStockEntry {
    /// Creates an empty draft with a reserved entry number.
    pub fn new(entry_number: impl Into<String>) -> Self {
        DraftStockEntry {
            entry_number: entry_number.into(),
            invoice_id: None,
            observed_revision: None,
            lines: Vec::new(),
            notes: None,
        }
    }

    /// Points the draft at an invoice, recording the revision seen.
    ///
    /// Switching invoices drops existing lines: they were validated
    /// against the old invoice's pools.
    pub fn set_invoice(&mut self, invoice_id: impl Into<String>, revision: i64) {
        let invoice_id = invoice_id.into();
        if self.invoice_id.as_deref() != Some(invoice_id.as_str()) {
            self.lines.clear();
        }
        self.invoice_id = Some(invoice_id);
        self.observed_revision = Some(revision);
    }

    /// Adds a line, snapshotting the item.
    pub fn add_line(
        &mut self,
        item: &JewelryItem,
        quantity: i64,
        remarks: Option<String>,
    ) -> CoreResult<&StockEntryLine> {
        validate_quantity(quantity)?;

        if self.lines.len() >= MAX_ENTRY_LINES {
            return Err(CoreError::TooManyLines {
                max: MAX_ENTRY_LINES,
            });
        }

        let remarks = remarks
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        self.lines.push(StockEntryLine::from_item(item, quantity, remarks));
        Ok(&self.lines[self.lines.len() - 1])
    }

    /// Removes a line by position, returning it.
    pub fn remove_line(&mut self, index: usize) -> Option<StockEntryLine> {
        if index < self.lines.len() {
            Some(self.lines.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Weight the draft would consume, per key.
    pub fn required_by_key(&self) -> MetalMap {
        let mut required = MetalMap::new();
        for line in &self.lines {
            *required.entry(line.key()).or_default() += line.weight();
        }
        required
    }

    pub fn total_weight(&self) -> Weight {
        self.lines.iter().map(StockEntryLine::weight).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metal::normalize;
    use crate::ValidationError;
    use rust_decimal_macros::dec;

    fn ring() -> JewelryItem {
        JewelryItem::new("RING-A", "Plain band", "Gold", dec!(22), Weight::from_grams(5))
    }

    fn chain() -> JewelryItem {
        JewelryItem::new("CHAIN-S", "Rope chain", "Silver", dec!(92.5), Weight::from_grams(12))
    }

    #[test]
    fn test_add_and_remove_lines() {
        let mut draft = DraftStockEntry::new("SE-000001");
        draft.add_line(&ring(), 2, None).unwrap();
        draft.add_line(&chain(), 1, Some("  rush  ".to_string())).unwrap();
        draft.add_line(&ring(), 3, Some("   ".to_string())).unwrap();

        assert_eq!(draft.lines.len(), 3);
        assert_eq!(draft.lines[1].remarks.as_deref(), Some("rush"));
        assert_eq!(draft.lines[2].remarks, None);
        assert_eq!(draft.total_weight(), Weight::from_grams(37));

        let removed = draft.remove_line(1).unwrap();
        assert_eq!(removed.item_code, "CHAIN-S");
        assert!(draft.remove_line(5).is_none());
        assert_eq!(draft.total_weight(), Weight::from_grams(25));
    }

    #[test]
    fn test_add_line_rejects_bad_quantity() {
        let mut draft = DraftStockEntry::new("SE-000001");
        let err = draft.add_line(&ring(), 0, None).unwrap_err();
        assert_eq!(
            err,
            CoreError::Validation(ValidationError::MustBePositive {
                field: "quantity".to_string()
            })
        );
        assert!(draft.is_empty());
    }

    #[test]
    fn test_line_limit() {
        let mut draft = DraftStockEntry::new("SE-000001");
        for _ in 0..MAX_ENTRY_LINES {
            draft.add_line(&ring(), 1, None).unwrap();
        }
        assert_eq!(
            draft.add_line(&ring(), 1, None).unwrap_err(),
            CoreError::TooManyLines {
                max: MAX_ENTRY_LINES
            }
        );
    }

    #[test]
    fn test_required_by_key_groups_lines() {
        let mut draft = DraftStockEntry::new("SE-000001");
        draft.add_line(&ring(), 2, None).unwrap();
        draft.add_line(&chain(), 1, None).unwrap();
        draft.add_line(&ring(), 1, None).unwrap();

        let required = draft.required_by_key();
        assert_eq!(required.len(), 2);
        assert_eq!(required[&normalize("Gold", dec!(22.0))], Weight::from_grams(15));
        assert_eq!(required[&normalize("Silver", dec!(92.50))], Weight::from_grams(12));
    }

    #[test]
    fn test_switching_invoice_clears_lines() {
        let mut draft = DraftStockEntry::new("SE-000001");
        draft.set_invoice("inv-1", 0);
        draft.add_line(&ring(), 1, None).unwrap();

        draft.set_invoice("inv-1", 2);
        assert_eq!(draft.lines.len(), 1);
        assert_eq!(draft.observed_revision, Some(2));

        draft.set_invoice("inv-2", 0);
        assert!(draft.is_empty());
        assert_eq!(draft.invoice_id.as_deref(), Some("inv-2"));
    }
}
