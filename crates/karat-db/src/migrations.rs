//! # Schema Migrations
//!
//! The Karat schema is embedded at compile time and applied on connect.
//! [`schema_status`] reports what a database file actually holds, so the
//! seed binary and health checks can tell a current ledger apart from a
//! half-initialized one.
//!
//! ```text
//! migrations/sqlite/
//! └── 001_initial_schema.sql   invoices, receipts, catalog, entries, lines,
//!                              entry number sequence
//! ```
//!
//! New schema changes go in a new numbered file; applied files are never
//! edited. No migration may add a stored balance column: availability is
//! always derived from receipts and active entries.

use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Tables the ledger reads or writes.
pub const LEDGER_TABLES: &[&str] = &[
    "purchase_invoices",
    "metal_receipt_lines",
    "jewelry_items",
    "stock_entries",
    "stock_entry_lines",
    "entry_number_sequence",
];

/// What the database file holds compared to the embedded schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaStatus {
    /// Latest applied migration version, if any.
    pub version: Option<i64>,
    /// Description of that migration (`initial schema`).
    pub description: Option<String>,
    /// Embedded migrations not yet applied.
    pub pending: usize,
    /// Ledger tables absent from the file.
    pub missing_tables: Vec<String>,
}

impl SchemaStatus {
    /// True when every migration is applied and every ledger table exists.
    pub fn is_current(&self) -> bool {
        self.pending == 0 && self.missing_tables.is_empty()
    }
}

/// Applies pending migrations and confirms the ledger tables exist.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<SchemaStatus> {
    MIGRATOR.run(pool).await?;

    let status = schema_status(pool).await?;
    if !status.missing_tables.is_empty() {
        return Err(DbError::MigrationFailed(format!(
            "ledger tables missing after migration: {}",
            status.missing_tables.join(", ")
        )));
    }

    info!(
        version = ?status.version,
        description = status.description.as_deref().unwrap_or(""),
        "Ledger schema is current"
    );
    Ok(status)
}

/// Reads the applied migrations and the ledger tables present.
///
/// Works on a file that was never migrated: everything is pending and
/// every ledger table is missing.
pub async fn schema_status(pool: &SqlitePool) -> DbResult<SchemaStatus> {
    let tables: HashSet<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(pool)
            .await?
            .into_iter()
            .collect();

    let applied: Vec<(i64, String)> = if tables.contains("_sqlx_migrations") {
        sqlx::query_as(
            "SELECT version, description FROM _sqlx_migrations WHERE success = 1 ORDER BY version",
        )
        .fetch_all(pool)
        .await?
    } else {
        Vec::new()
    };

    let applied_versions: HashSet<i64> = applied.iter().map(|(version, _)| *version).collect();
    let pending = MIGRATOR
        .iter()
        .filter(|m| !applied_versions.contains(&m.version))
        .count();

    let missing_tables: Vec<String> = LEDGER_TABLES
        .iter()
        .filter(|table| !tables.contains(**table))
        .map(|table| table.to_string())
        .collect();

    if pending > 0 {
        warn!(pending, "Ledger schema has unapplied migrations");
    }

    let (version, description) = match applied.into_iter().last() {
        Some((version, description)) => (Some(version), Some(description)),
        None => (None, None),
    };

    Ok(SchemaStatus {
        version,
        description,
        pending,
        missing_tables,
    })
}
