//! # Stock Entry Repository
//!
//! Committed stock entries, the commit transaction and voiding.
//!
//! ## Entry Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Stock Entry Lifecycle                             │
//! │                                                                         │
//! │  1. OPEN DRAFT                                                         │
//! │     └── open_draft() → DraftStockEntry { entry_number: SE-000042 }     │
//! │         (number reserved; nothing else is written)                     │
//! │                                                                         │
//! │  2. AUTHOR (in memory, karat-core)                                     │
//! │     └── set_invoice() / add_line() / remove_line()                     │
//! │                                                                         │
//! │  3. COMMIT                                                             │
//! │     └── lock invoice                                                   │
//! │     └── BEGIN; bump invoice revision                                   │
//! │     └── reload receipts + active entries inside the transaction        │
//! │     └── validate whole draft against fresh availability                │
//! │     └── insert header + lines; COMMIT                                  │
//! │         (any failure: ROLLBACK, nothing persisted)                     │
//! │                                                                         │
//! │  4. (OPTIONAL) VOID                                                    │
//! │     └── void_entry() → status = void, weight returns to the pools      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use karat_core::entry_number::{format_entry_number, parse_entry_number};
use karat_core::{
    CoreError, DraftStockEntry, InvoiceLedger, StockEntryLine, StockEntryMaster,
    StockEntryStatus, Weight,
};

use super::invoice::load_invoice;
use super::parse_stored_purity;
use crate::error::{DbError, DbResult, LedgerError, LedgerResult};
use crate::locks::InvoiceLocks;

#[derive(Debug, sqlx::FromRow)]
struct EntryRecord {
    id: String,
    entry_number: String,
    invoice_id: String,
    status: StockEntryStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    voided_at: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct LineRecord {
    id: String,
    entry_id: String,
    item_id: String,
    item_code_snapshot: String,
    metal_type_snapshot: String,
    purity_snapshot: String,
    net_weight_mg_snapshot: i64,
    quantity: i64,
    remarks: Option<String>,
}

impl LineRecord {
    fn into_line(self) -> DbResult<StockEntryLine> {
        let purity: Decimal = parse_stored_purity("StockEntryLine", &self.id, &self.purity_snapshot)?;
        Ok(StockEntryLine {
            id: self.id,
            item_id: self.item_id,
            item_code: self.item_code_snapshot,
            metal_type: self.metal_type_snapshot,
            purity,
            net_weight: Weight::from_milligrams(self.net_weight_mg_snapshot),
            quantity: self.quantity,
            remarks: self.remarks,
        })
    }
}

/// Which entries to load. Every variant filters `stock_entries e`.
#[derive(Debug, Clone, Copy)]
enum EntryScope<'a> {
    /// Active entries against one invoice.
    ActiveForInvoice(&'a str),
    /// All entries against one invoice, void included.
    AllForInvoice(&'a str),
    /// Active entries against every invoice.
    AllActive,
    /// A single entry by number.
    Number(&'a str),
}

impl<'a> EntryScope<'a> {
    fn where_clause(&self) -> &'static str {
        match self {
            EntryScope::ActiveForInvoice(_) => "WHERE e.invoice_id = ?1 AND e.status = 'active'",
            EntryScope::AllForInvoice(_) => "WHERE e.invoice_id = ?1",
            EntryScope::AllActive => "WHERE e.status = 'active'",
            EntryScope::Number(_) => "WHERE e.entry_number = ?1",
        }
    }

    fn param(&self) -> Option<&'a str> {
        match *self {
            EntryScope::ActiveForInvoice(p)
            | EntryScope::AllForInvoice(p)
            | EntryScope::Number(p) => Some(p),
            EntryScope::AllActive => None,
        }
    }
}

/// Loads entries with their lines on the given connection.
async fn load_entries(
    conn: &mut SqliteConnection,
    scope: EntryScope<'_>,
) -> DbResult<Vec<StockEntryMaster>> {
    let entries_sql = format!(
        r#"
        SELECT e.id, e.entry_number, e.invoice_id, e.status, e.notes, e.created_at, e.voided_at
        FROM stock_entries e
        {}
        ORDER BY e.entry_number
        "#,
        scope.where_clause()
    );
    let lines_sql = format!(
        r#"
        SELECT l.id, l.entry_id, l.item_id, l.item_code_snapshot, l.metal_type_snapshot,
               l.purity_snapshot, l.net_weight_mg_snapshot, l.quantity, l.remarks
        FROM stock_entry_lines l
        JOIN stock_entries e ON e.id = l.entry_id
        {}
        ORDER BY l.entry_id, l.line_no
        "#,
        scope.where_clause()
    );

    let mut entries_query = sqlx::query_as::<_, EntryRecord>(&entries_sql);
    let mut lines_query = sqlx::query_as::<_, LineRecord>(&lines_sql);
    if let Some(param) = scope.param() {
        entries_query = entries_query.bind(param);
        lines_query = lines_query.bind(param);
    }

    let records = entries_query.fetch_all(&mut *conn).await?;
    let line_records = lines_query.fetch_all(&mut *conn).await?;

    let mut lines_by_entry: HashMap<String, Vec<StockEntryLine>> = HashMap::new();
    for record in line_records {
        let entry_id = record.entry_id.clone();
        lines_by_entry
            .entry(entry_id)
            .or_default()
            .push(record.into_line()?);
    }

    Ok(records
        .into_iter()
        .map(|record| StockEntryMaster {
            lines: lines_by_entry.remove(&record.id).unwrap_or_default(),
            id: record.id,
            entry_number: record.entry_number,
            invoice_id: record.invoice_id,
            status: record.status,
            notes: record.notes,
            created_at: record.created_at,
            voided_at: record.voided_at,
        })
        .collect())
}

/// Bumps the invoice revision and returns the value it had before, or
/// `None` when no such invoice exists.
///
/// Must be the first statement of a commit or void transaction: the write
/// takes SQLite's database lock before anything is read.
async fn bump_revision(conn: &mut SqliteConnection, invoice_id: &str) -> DbResult<Option<i64>> {
    let revision: Option<i64> = sqlx::query_scalar(
        "UPDATE purchase_invoices SET revision = revision + 1 WHERE id = ?1 RETURNING revision",
    )
    .bind(invoice_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(revision.map(|r| r - 1))
}

/// Repository for stock entry operations.
#[derive(Debug, Clone)]
pub struct StockEntryRepository {
    pool: SqlitePool,
    locks: Arc<InvoiceLocks>,
}

impl StockEntryRepository {
    /// Creates a new StockEntryRepository.
    pub fn new(pool: SqlitePool, locks: Arc<InvoiceLocks>) -> Self {
        StockEntryRepository { pool, locks }
    }

    /// Reserves the next entry number and returns an empty draft.
    ///
    /// Abandoned drafts leave a gap in the sequence; numbers are never
    /// reused.
    pub async fn open_draft(&self) -> DbResult<DraftStockEntry> {
        let seq: i64 = sqlx::query_scalar(
            "UPDATE entry_number_sequence SET last_value = last_value + 1 WHERE id = 1 RETURNING last_value",
        )
        .fetch_one(&self.pool)
        .await?;

        let entry_number = format_entry_number(seq as u64);
        debug!(entry_number = %entry_number, "Opened draft stock entry");

        Ok(DraftStockEntry::new(entry_number))
    }

    /// Gets an entry (any status) by number.
    pub async fn get_by_number(&self, entry_number: &str) -> DbResult<Option<StockEntryMaster>> {
        let mut conn = self.pool.acquire().await?;
        Ok(load_entries(&mut conn, EntryScope::Number(entry_number))
            .await?
            .into_iter()
            .next())
    }

    /// All entries against an invoice, void included, by entry number.
    pub async fn list_for_invoice(&self, invoice_id: &str) -> DbResult<Vec<StockEntryMaster>> {
        let mut conn = self.pool.acquire().await?;
        load_entries(&mut conn, EntryScope::AllForInvoice(invoice_id)).await
    }

    /// Active entries against an invoice; what consumption is computed from.
    pub async fn list_active_for_invoice(
        &self,
        invoice_id: &str,
    ) -> DbResult<Vec<StockEntryMaster>> {
        let mut conn = self.pool.acquire().await?;
        load_entries(&mut conn, EntryScope::ActiveForInvoice(invoice_id)).await
    }

    /// Active entries against every invoice.
    pub async fn list_active(&self) -> DbResult<Vec<StockEntryMaster>> {
        let mut conn = self.pool.acquire().await?;
        load_entries(&mut conn, EntryScope::AllActive).await
    }

    /// Commits a draft atomically.
    ///
    /// ## What This Does
    /// 1. Takes the invoice's lock (same-process serialization)
    /// 2. Opens a transaction and bumps the invoice revision first
    /// 3. Reloads receipts and active entries inside the transaction
    /// 4. Validates every line cumulatively against that fresh state
    /// 5. Inserts the header and all lines, then commits
    ///
    /// Any failure drops the transaction, which rolls it back: either the
    /// whole entry is persisted or none of it is.
    ///
    /// ## Errors
    /// - `Rejected` for bad input, an unknown invoice or a metal shortfall
    /// - `ConcurrencyConflict` when the shortfall exists only because
    ///   another commit landed after the draft picked its invoice
    /// - `Persistence(EntryNumberCollision)` when the number already exists
    pub async fn commit(&self, draft: &DraftStockEntry) -> LedgerResult<StockEntryMaster> {
        parse_entry_number(&draft.entry_number).map_err(CoreError::from)?;
        let invoice_id = draft
            .invoice_id
            .clone()
            .ok_or(CoreError::MissingInvoice)?;
        if draft.is_empty() {
            return Err(CoreError::EmptyEntry.into());
        }

        let _guard = self.locks.acquire(&invoice_id).await;
        let mut tx = self.pool.begin().await?;

        let Some(revision_before) = bump_revision(&mut tx, &invoice_id).await? else {
            return Err(CoreError::UnknownInvoice { invoice_id }.into());
        };

        let invoice = load_invoice(&mut tx, &invoice_id)
            .await?
            .ok_or_else(|| DbError::not_found("PurchaseInvoice", invoice_id.as_str()))?;
        let entries = load_entries(&mut tx, EntryScope::ActiveForInvoice(&invoice_id)).await?;

        let ledger = InvoiceLedger::new(&invoice, &entries);
        if let Err(rejection) = ledger.validate_draft(draft) {
            warn!(
                entry_number = %draft.entry_number,
                invoice_number = %invoice.invoice_number,
                error = %rejection,
                "Stock entry rejected at commit"
            );
            return Err(match draft.observed_revision {
                Some(observed)
                    if observed < revision_before && rejection.is_allocation_rejection() =>
                {
                    LedgerError::ConcurrencyConflict {
                        invoice_number: invoice.invoice_number.clone(),
                        observed_revision: observed,
                        current_revision: revision_before,
                        source: rejection,
                    }
                }
                _ => LedgerError::Rejected(rejection),
            });
        }

        let entry = StockEntryMaster {
            id: uuid::Uuid::new_v4().to_string(),
            entry_number: draft.entry_number.clone(),
            invoice_id: invoice_id.clone(),
            status: StockEntryStatus::Active,
            lines: draft.lines.clone(),
            notes: draft.notes.clone(),
            created_at: Utc::now(),
            voided_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO stock_entries (id, entry_number, invoice_id, status, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.entry_number)
        .bind(&entry.invoice_id)
        .bind(entry.status)
        .bind(&entry.notes)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            err if err.is_unique_violation_on("stock_entries.entry_number") => {
                DbError::EntryNumberCollision(entry.entry_number.clone())
            }
            other => other,
        })?;

        for (line_no, line) in entry.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO stock_entry_lines (
                    id, entry_id, line_no, item_id,
                    item_code_snapshot, metal_type_snapshot, purity_snapshot, net_weight_mg_snapshot,
                    quantity, remarks
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(&line.id)
            .bind(&entry.id)
            .bind(line_no as i64)
            .bind(&line.item_id)
            .bind(&line.item_code)
            .bind(&line.metal_type)
            .bind(line.purity.to_string())
            .bind(line.net_weight.milligrams())
            .bind(line.quantity)
            .bind(&line.remarks)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            entry_number = %entry.entry_number,
            invoice_number = %invoice.invoice_number,
            lines = entry.lines.len(),
            total = %entry.total_weight(),
            "Stock entry committed"
        );

        Ok(entry)
    }

    /// Voids an active entry; its weight returns to the invoice's pools.
    ///
    /// The entry row stays, with `status = void` and `voided_at` set.
    pub async fn void_entry(&self, entry_number: &str) -> LedgerResult<StockEntryMaster> {
        let invoice_id: String =
            sqlx::query_scalar("SELECT invoice_id FROM stock_entries WHERE entry_number = ?1")
                .bind(entry_number)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| CoreError::UnknownEntry {
                    entry_number: entry_number.to_string(),
                })?;

        let _guard = self.locks.acquire(&invoice_id).await;
        let mut tx = self.pool.begin().await?;

        bump_revision(&mut tx, &invoice_id)
            .await?
            .ok_or_else(|| DbError::not_found("PurchaseInvoice", invoice_id.as_str()))?;

        let result = sqlx::query(
            r#"
            UPDATE stock_entries SET status = ?2, voided_at = ?3
            WHERE entry_number = ?1 AND status = ?4
            "#,
        )
        .bind(entry_number)
        .bind(StockEntryStatus::Void)
        .bind(Utc::now())
        .bind(StockEntryStatus::Active)
        .execute(&mut *tx)
        .await?;

        let entry = load_entries(&mut tx, EntryScope::Number(entry_number))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("StockEntry", entry_number))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::EntryNotActive {
                entry_number: entry_number.to_string(),
                status: entry.status,
            }
            .into());
        }

        tx.commit().await?;

        info!(
            entry_number = %entry_number,
            invoice_id = %invoice_id,
            released = %entry.total_weight(),
            "Stock entry voided"
        );

        Ok(entry)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
