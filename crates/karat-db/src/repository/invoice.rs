//! # Invoice Repository
//!
//! Purchase invoices and the metal receipt lines on them.
//!
//! Receipt lines are written once, with the invoice, and never updated.
//! The only column that moves afterwards is `purchase_invoices.revision`,
//! which the stock entry repository bumps on every commit and void.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use karat_core::{MetalReceiptLine, PurchaseInvoice, Weight};

use super::parse_stored_purity;
use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRecord {
    id: String,
    invoice_number: String,
    supplier_name: String,
    revision: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ReceiptRecord {
    id: String,
    invoice_id: String,
    metal_type: String,
    purity: String,
    gross_weight_mg: i64,
}

impl ReceiptRecord {
    fn into_receipt(self) -> DbResult<MetalReceiptLine> {
        let purity = parse_stored_purity("MetalReceiptLine", &self.id, &self.purity)?;
        Ok(MetalReceiptLine {
            metal_type: self.metal_type,
            purity,
            gross_weight: Weight::from_milligrams(self.gross_weight_mg),
        })
    }
}

impl InvoiceRecord {
    fn into_invoice(self, receipts: Vec<MetalReceiptLine>) -> PurchaseInvoice {
        PurchaseInvoice {
            id: self.id,
            invoice_number: self.invoice_number,
            supplier_name: self.supplier_name,
            receipts,
            revision: self.revision,
            created_at: self.created_at,
        }
    }
}

/// Repository for purchase invoice operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Inserts an invoice and its receipt lines in one transaction.
    ///
    /// Input validation (non-negative weights, purity range) happens in
    /// the service before this is called.
    pub async fn insert(&self, invoice: &PurchaseInvoice) -> DbResult<()> {
        debug!(
            id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            receipts = invoice.receipts.len(),
            "Inserting purchase invoice"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO purchase_invoices (id, invoice_number, supplier_name, revision, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.supplier_name)
        .bind(invoice.revision)
        .bind(invoice.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => {
                DbError::duplicate(field, invoice.invoice_number.clone())
            }
            other => other,
        })?;

        for (line_no, receipt) in invoice.receipts.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO metal_receipt_lines (
                    id, invoice_id, line_no, metal_type, purity, gross_weight_mg
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&invoice.id)
            .bind(line_no as i64)
            .bind(&receipt.metal_type)
            .bind(receipt.purity.to_string())
            .bind(receipt.gross_weight.milligrams())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets an invoice with its receipts by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PurchaseInvoice>> {
        let mut conn = self.pool.acquire().await?;
        load_invoice(&mut conn, id).await
    }

    /// Gets an invoice with its receipts by supplier invoice number.
    pub async fn get_by_number(&self, invoice_number: &str) -> DbResult<Option<PurchaseInvoice>> {
        let mut conn = self.pool.acquire().await?;

        let id: Option<String> =
            sqlx::query_scalar("SELECT id FROM purchase_invoices WHERE invoice_number = ?1")
                .bind(invoice_number)
                .fetch_optional(&mut *conn)
                .await?;

        match id {
            Some(id) => load_invoice(&mut conn, &id).await,
            None => Ok(None),
        }
    }

    /// Lists every invoice, oldest first, with receipts.
    pub async fn list_all(&self) -> DbResult<Vec<PurchaseInvoice>> {
        let records: Vec<InvoiceRecord> = sqlx::query_as(
            r#"
            SELECT id, invoice_number, supplier_name, revision, created_at
            FROM purchase_invoices
            ORDER BY created_at, invoice_number
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let receipts: Vec<ReceiptRecord> = sqlx::query_as(
            r#"
            SELECT id, invoice_id, metal_type, purity, gross_weight_mg
            FROM metal_receipt_lines
            ORDER BY invoice_id, line_no
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_invoice: HashMap<String, Vec<MetalReceiptLine>> = HashMap::new();
        for record in receipts {
            let invoice_id = record.invoice_id.clone();
            by_invoice
                .entry(invoice_id)
                .or_default()
                .push(record.into_receipt()?);
        }

        Ok(records
            .into_iter()
            .map(|record| {
                let receipts = by_invoice.remove(&record.id).unwrap_or_default();
                record.into_invoice(receipts)
            })
            .collect())
    }

    /// Current revision of an invoice, `None` if it does not exist.
    pub async fn revision(&self, id: &str) -> DbResult<Option<i64>> {
        let revision = sqlx::query_scalar("SELECT revision FROM purchase_invoices WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(revision)
    }
}

/// Loads one invoice and its receipts on the given connection.
///
/// Takes a connection rather than the pool so the commit path can read
/// inside its own transaction.
pub(crate) async fn load_invoice(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<PurchaseInvoice>> {
    let record: Option<InvoiceRecord> = sqlx::query_as(
        r#"
        SELECT id, invoice_number, supplier_name, revision, created_at
        FROM purchase_invoices
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(record) = record else {
        return Ok(None);
    };

    let receipts: Vec<ReceiptRecord> = sqlx::query_as(
        r#"
        SELECT id, invoice_id, metal_type, purity, gross_weight_mg
        FROM metal_receipt_lines
        WHERE invoice_id = ?1
        ORDER BY line_no
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let receipts = receipts
        .into_iter()
        .map(ReceiptRecord::into_receipt)
        .collect::<DbResult<Vec<_>>>()?;

    Ok(Some(record.into_invoice(receipts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use rust_decimal_macros::dec;

    fn gold_and_silver() -> PurchaseInvoice {
        PurchaseInvoice::new(
            "PI-001",
            "Acme Bullion",
            vec![
                MetalReceiptLine::new("Gold", dec!(22.00), Weight::from_grams(100)),
                MetalReceiptLine::new("Silver", dec!(92.5), Weight::from_grams(250)),
            ],
        )
    }

    #[tokio::test]
    async fn test_insert_and_load() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();
        let invoice = gold_and_silver();
        repo.insert(&invoice).await.unwrap();

        let loaded = repo.get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(loaded.invoice_number, "PI-001");
        assert_eq!(loaded.revision, 0);
        assert_eq!(loaded.receipts.len(), 2);
        assert_eq!(loaded.receipts[0].metal_type, "Gold");
        // Stored as entered; equal in value either way.
        assert_eq!(loaded.receipts[0].purity, dec!(22));
        assert_eq!(loaded.receipts[1].gross_weight, Weight::from_grams(250));

        let by_number = repo.get_by_number("PI-001").await.unwrap().unwrap();
        assert_eq!(by_number.id, invoice.id);
        assert!(repo.get_by_number("PI-404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_invoice_number() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();
        repo.insert(&gold_and_silver()).await.unwrap();

        let err = repo.insert(&gold_and_silver()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { value, .. } if value == "PI-001"));
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_all_groups_receipts() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.invoices();
        repo.insert(&gold_and_silver()).await.unwrap();
        repo.insert(&PurchaseInvoice::new(
            "PI-002",
            "Northern Metals",
            vec![MetalReceiptLine::new("Gold", dec!(18), Weight::from_grams(40))],
        ))
        .await
        .unwrap();

        let invoices = repo.list_all().await.unwrap();
        assert_eq!(invoices.len(), 2);
        let second = invoices
            .iter()
            .find(|i| i.invoice_number == "PI-002")
            .unwrap();
        assert_eq!(second.receipts.len(), 1);
        assert_eq!(second.receipts[0].purity, dec!(18));
    }
}
