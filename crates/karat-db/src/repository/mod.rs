//! # Repository Module
//!
//! Database repository implementations for Karat.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  StockLedgerService                                                    │
//! │       │                                                                 │
//! │       │  db.stock_entries().commit(&draft)                             │
//! │       ▼                                                                 │
//! │  InvoiceRepository        JewelryItemRepository   StockEntryRepository │
//! │  ├── insert               ├── insert              ├── open_draft       │
//! │  ├── get_by_id            ├── get_by_id           ├── commit           │
//! │  ├── get_by_number        ├── get_by_code         ├── void_entry       │
//! │  └── list_all             └── list_active         └── list_for_invoice │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are read with `sqlx::query_as` into private `FromRow` records and
//! converted to `karat_core` types here; weights come back as milligrams,
//! purities as the text that was stored.
//!
//! ## Available Repositories
//!
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Purchase invoices and receipt lines
//! - [`JewelryItemRepository`](item::JewelryItemRepository) - Catalog
//! - [`StockEntryRepository`](stock_entry::StockEntryRepository) - Entries, commit, void

pub mod invoice;
pub mod item;
pub mod stock_entry;

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{DbError, DbResult};

/// Parses a purity column back into a decimal.
fn parse_stored_purity(entity: &str, id: &str, stored: &str) -> DbResult<Decimal> {
    Decimal::from_str(stored)
        .map_err(|e| DbError::corrupt(entity, id, format!("purity '{}': {}", stored, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stored_purity() {
        assert_eq!(
            parse_stored_purity("JewelryItem", "x", "22.00").unwrap(),
            Decimal::new(2200, 2)
        );
        assert!(matches!(
            parse_stored_purity("JewelryItem", "x", "twenty-two"),
            Err(DbError::Corrupt { .. })
        ));
    }
}
