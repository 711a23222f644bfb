//! # karat-core: Pure Ledger Logic for Karat
//!
//! This crate is the **heart** of the metal-stock reconciliation engine.
//! Every function here is pure: it takes invoices, catalog items and stock
//! entries as arguments and returns derived values, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Karat Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Forms (invoice picker, item picker, entry form)    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    karat-db (StockLedgerService)                │   │
//! │  │        load invoice + entries, lock invoice, persist commit    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ karat-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   metal   │  │  ledger   │  │allocation │  │   draft   │  │   │
//! │  │   │ MetalKey  │  │ received  │  │ validate  │  │  authoring│  │   │
//! │  │   │ normalize │  │ consumed  │  │ shortfall │  │   lines   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO LOGGING • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`metal`] - `MetalKey` and purity normalization
//! - [`weight`] - `Weight` type with integer milligram arithmetic
//! - [`types`] - Domain types (invoice, item, stock entry)
//! - [`draft`] - The in-memory stock entry being authored
//! - [`ledger`] - Received / consumed / available views per invoice
//! - [`allocation`] - Allocation validation and picker filters
//! - [`entry_number`] - Stock entry number formatting
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation at the collaborator boundary
//!
//! ## Example Usage
//!
//! ```rust
//! use karat_core::ledger::InvoiceLedger;
//! use karat_core::metal::normalize;
//! use karat_core::types::{MetalReceiptLine, PurchaseInvoice};
//! use karat_core::Weight;
//! use rust_decimal::Decimal;
//!
//! let invoice = PurchaseInvoice::new(
//!     "PI-001",
//!     "Acme Bullion",
//!     vec![MetalReceiptLine::new("Gold", Decimal::new(220, 1), Weight::from_grams(100))],
//! );
//!
//! let ledger = InvoiceLedger::new(&invoice, &[]);
//! let available = ledger.available_by_key();
//!
//! // "22.0" on the invoice matches "22" in the catalog.
//! let key = normalize("Gold", Decimal::new(22, 0));
//! assert_eq!(available[&key], Weight::from_grams(100));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod draft;
pub mod entry_number;
pub mod error;
pub mod ledger;
pub mod metal;
pub mod types;
pub mod validation;
pub mod weight;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use draft::DraftStockEntry;
pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{InvoiceLedger, MetalMap};
pub use metal::MetalKey;
pub use types::*;
pub use weight::Weight;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single stock entry.
///
/// ## Business Reason
/// A stock entry is one workshop batch; anything larger is almost always
/// two batches typed into one form.
pub const MAX_ENTRY_LINES: usize = 100;

/// Maximum quantity of a single jewelry item on one line.
///
/// Catches typing 1000 instead of 10.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Largest receipt or item weight accepted, in milligrams (1,000 tonnes).
///
/// Keeps every ledger sum well inside `i64`.
pub const MAX_WEIGHT_MG: i64 = 1_000_000_000_000;

/// Prefix of every generated stock entry number.
pub const ENTRY_NUMBER_PREFIX: &str = "SE";
