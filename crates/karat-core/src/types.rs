//! # Domain Types
//!
//! Core domain types used throughout Karat.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ PurchaseInvoice │   │ StockEntryMaster│   │  JewelryItem    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  invoice_id     │   │  id (UUID)      │       │
//! │  │  invoice_number │   │  entry_number   │   │  item_code      │       │
//! │  │  receipts[]     │   │  status         │   │  metal, purity  │       │
//! │  │  revision       │   │  lines[] ───────┼──►│  net_weight     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  MetalPool (derived, never stored): received / consumed / available    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every stored entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (invoice_number, item_code, entry_number) - human-readable

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::metal::{normalize, MetalKey};
use crate::weight::Weight;

// =============================================================================
// Purchase Invoice
// =============================================================================

/// One metal line on a supplier invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MetalReceiptLine {
    pub metal_type: String,
    #[ts(as = "String")]
    pub purity: Decimal,
    pub gross_weight: Weight,
}

impl MetalReceiptLine {
    pub fn new(metal_type: impl Into<String>, purity: Decimal, gross_weight: Weight) -> Self {
        MetalReceiptLine {
            metal_type: metal_type.into(),
            purity,
            gross_weight,
        }
    }

    /// The normalized pool this line feeds.
    pub fn key(&self) -> MetalKey {
        normalize(&self.metal_type, self.purity)
    }
}

/// A supplier receipt of raw metal.
///
/// Receipts are fixed when the invoice is created; only `revision` moves
/// afterwards, once per commit or void against the invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseInvoice {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Supplier's invoice number - business identifier.
    pub invoice_number: String,

    pub supplier_name: String,

    /// Metal received, as recorded on the invoice.
    pub receipts: Vec<MetalReceiptLine>,

    /// Bumped by every commit or void against this invoice.
    pub revision: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl PurchaseInvoice {
    /// Creates a new in-memory invoice with a fresh id.
    pub fn new(
        invoice_number: impl Into<String>,
        supplier_name: impl Into<String>,
        receipts: Vec<MetalReceiptLine>,
    ) -> Self {
        PurchaseInvoice {
            id: Uuid::new_v4().to_string(),
            invoice_number: invoice_number.into(),
            supplier_name: supplier_name.into(),
            receipts,
            revision: 0,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Jewelry Item
// =============================================================================

/// A catalog entry for a manufactured piece.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct JewelryItem {
    pub id: String,

    /// Unique catalog code.
    pub item_code: String,

    pub name: String,

    pub metal_type: String,

    #[ts(as = "String")]
    pub purity: Decimal,

    /// Metal consumed by one unit of this item.
    pub net_weight: Weight,

    /// Soft delete flag.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl JewelryItem {
    /// Creates a new active catalog item with a fresh id.
    pub fn new(
        item_code: impl Into<String>,
        name: impl Into<String>,
        metal_type: impl Into<String>,
        purity: Decimal,
        net_weight: Weight,
    ) -> Self {
        let now = Utc::now();
        JewelryItem {
            id: Uuid::new_v4().to_string(),
            item_code: item_code.into(),
            name: name.into(),
            metal_type: metal_type.into(),
            purity,
            net_weight,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// The pool this item draws from.
    pub fn key(&self) -> MetalKey {
        normalize(&self.metal_type, self.purity)
    }
}

// =============================================================================
// Stock Entry Status
// =============================================================================

/// Lifecycle of a committed stock entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockEntryStatus {
    /// Counts towards consumption.
    Active,
    /// Reversed; its weight is back in the pool.
    Void,
}

impl Default for StockEntryStatus {
    fn default() -> Self {
        StockEntryStatus::Active
    }
}

// =============================================================================
// Stock Entry
// =============================================================================

/// One line of a stock entry.
///
/// Uses the snapshot pattern: item code, metal, purity and per-unit weight
/// are frozen when the line is added, so editing the catalog later cannot
/// move committed consumption between pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockEntryLine {
    pub id: String,
    pub item_id: String,
    /// Item code at time of allocation (frozen).
    pub item_code: String,
    /// Metal type at time of allocation (frozen).
    pub metal_type: String,
    /// Purity at time of allocation (frozen).
    #[ts(as = "String")]
    pub purity: Decimal,
    /// Per-unit net weight at time of allocation (frozen).
    pub net_weight: Weight,
    pub quantity: i64,
    pub remarks: Option<String>,
}

impl StockEntryLine {
    /// Snapshots an item into a new line.
    pub fn from_item(item: &JewelryItem, quantity: i64, remarks: Option<String>) -> Self {
        StockEntryLine {
            id: Uuid::new_v4().to_string(),
            item_id: item.id.clone(),
            item_code: item.item_code.clone(),
            metal_type: item.metal_type.clone(),
            purity: item.purity,
            net_weight: item.net_weight,
            quantity,
            remarks,
        }
    }

    pub fn key(&self) -> MetalKey {
        normalize(&self.metal_type, self.purity)
    }

    /// `net_weight × quantity`.
    pub fn weight(&self) -> Weight {
        self.net_weight * self.quantity
    }
}

/// A committed allocation of invoice metal to manufactured items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockEntryMaster {
    pub id: String,
    /// Generated, unique (`SE-000042`).
    pub entry_number: String,
    pub invoice_id: String,
    pub status: StockEntryStatus,
    pub lines: Vec<StockEntryLine>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub voided_at: Option<DateTime<Utc>>,
}

impl StockEntryMaster {
    /// Whether this entry counts towards consumption.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == StockEntryStatus::Active
    }

    /// Total weight across all lines.
    pub fn total_weight(&self) -> Weight {
        self.lines.iter().map(StockEntryLine::weight).sum()
    }
}

// =============================================================================
// Metal Pool
// =============================================================================

/// Derived per-key balance for one invoice, for display panels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MetalPool {
    pub key: MetalKey,
    pub received: Weight,
    pub consumed: Weight,
    pub available: Weight,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_line_snapshots_item() {
        let mut item = JewelryItem::new("RING-A", "Plain band", "Gold", dec!(22), Weight::from_grams(5));
        let line = StockEntryLine::from_item(&item, 3, Some("polish".to_string()));

        item.net_weight = Weight::from_grams(9);
        item.purity = dec!(18);

        assert_eq!(line.weight(), Weight::from_grams(15));
        assert_eq!(line.key(), normalize("Gold", dec!(22.00)));
        assert_eq!(line.item_code, "RING-A");
    }

    #[test]
    fn test_receipt_and_item_keys_match_across_notation() {
        let receipt = MetalReceiptLine::new("Gold", dec!(22.0), Weight::from_grams(100));
        let item = JewelryItem::new("RING-A", "Plain band", "Gold", dec!(22), Weight::from_grams(5));
        assert_eq!(receipt.key(), item.key());
    }

    #[test]
    fn test_entry_total_weight() {
        let item = JewelryItem::new("RING-A", "Plain band", "Gold", dec!(22), Weight::from_grams(5));
        let entry = StockEntryMaster {
            id: "e1".to_string(),
            entry_number: "SE-000001".to_string(),
            invoice_id: "inv".to_string(),
            status: StockEntryStatus::Active,
            lines: vec![
                StockEntryLine::from_item(&item, 2, None),
                StockEntryLine::from_item(&item, 3, None),
            ],
            notes: None,
            created_at: Utc::now(),
            voided_at: None,
        };
        assert_eq!(entry.total_weight(), Weight::from_grams(25));
        assert!(entry.is_active());
    }

    #[test]
    fn test_status_default_and_serde() {
        assert_eq!(StockEntryStatus::default(), StockEntryStatus::Active);
        assert_eq!(serde_json::to_string(&StockEntryStatus::Void).unwrap(), "\"void\"");
    }
}
