//! # karat-db: Database Layer for Karat
//!
//! This crate stores invoices, the catalog and stock entries in SQLite via
//! sqlx, and hosts the commit path that keeps allocations honest when
//! several sessions work the same invoice.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Karat Data Flow                                  │
//! │                                                                         │
//! │  Stock entry form / pickers                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     karat-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ StockLedger   │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ Service       │───►│ invoice.rs    │    │  (embedded)  │  │   │
//! │  │   │ (service.rs)  │    │ item.rs       │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    │ stock_entry.rs│    └──────────────┘  │   │
//! │  │                        └───────┬───────┘                       │   │
//! │  │   ┌───────────────┐            │  commit / void                │   │
//! │  │   │ InvoiceLocks  │◄───────────┘                               │   │
//! │  │   └───────────────┘                                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                              ▲                                  │
//! │       ▼                              │ pure ledger math                 │
//! │  SQLite (WAL)                   karat-core                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - `DbConfig` builder and environment loading
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - `DbError` and the facade's `LedgerError`
//! - [`locks`] - Per-invoice commit serialization
//! - [`repository`] - Invoice, catalog and stock entry repositories
//! - [`service`] - `StockLedgerService`, the facade used by forms
//!
//! ## Usage
//!
//! ```rust,ignore
//! use karat_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//! let ledger = db.ledger();
//!
//! let mut draft = ledger.open_draft().await?;
//! ledger.select_invoice(&mut draft, &invoice_id).await?;
//! ledger.add_line(&mut draft, "RING-A", 10, None).await?;
//! let entry = ledger.commit_entry(&draft).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod locks;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, DbConfig};
pub use error::{DbError, DbResult, LedgerError, LedgerResult};
pub use locks::InvoiceLocks;
pub use pool::Database;
pub use service::StockLedgerService;

// Repository re-exports for convenience
pub use repository::invoice::InvoiceRepository;
pub use repository::item::JewelryItemRepository;
pub use repository::stock_entry::StockEntryRepository;
