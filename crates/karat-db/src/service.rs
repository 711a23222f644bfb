//! # Stock Ledger Service
//!
//! The facade forms and pickers talk to. Every read recomputes
//! availability from receipts and active entries; nothing is cached.
//!
//! ## Form Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Stock Entry Form                                  │
//! │                                                                         │
//! │  open_draft()                         → SE-000042, empty               │
//! │  list_invoices_with_available_metal() → invoice picker                 │
//! │  select_invoice(draft, PI-001)        → records revision               │
//! │  list_items_matching_invoice(PI-001)  → item picker                    │
//! │  get_pools(PI-001)                    → received / consumed / available│
//! │  add_line(draft, RING-A, 10)          → validated against pools minus  │
//! │                                          the draft's pending lines     │
//! │  commit_entry(draft)                  → re-validated under lock        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, warn};

use karat_core::allocation::{invoices_with_available, items_matching};
use karat_core::validation::{validate_invoice_number, validate_item, validate_receipt_line};
use karat_core::{
    CoreError, DraftStockEntry, InvoiceLedger, JewelryItem, MetalMap, MetalPool,
    MetalReceiptLine, PurchaseInvoice, StockEntryLine, StockEntryMaster, ValidationError,
    Weight,
};

use crate::error::{LedgerError, LedgerResult};
use crate::pool::Database;

/// Facade over the repositories and the pure ledger.
#[derive(Debug, Clone)]
pub struct StockLedgerService {
    db: Database,
}

impl StockLedgerService {
    pub fn new(db: Database) -> Self {
        StockLedgerService { db }
    }

    // -------------------------------------------------------------------------
    // Collaborator boundary
    // -------------------------------------------------------------------------

    /// Records a supplier invoice.
    ///
    /// Rejects negative receipt weights and purities outside (0, 100].
    pub async fn create_invoice(
        &self,
        invoice_number: &str,
        supplier_name: &str,
        receipts: Vec<MetalReceiptLine>,
    ) -> LedgerResult<PurchaseInvoice> {
        validate_invoice_number(invoice_number).map_err(CoreError::from)?;
        if supplier_name.trim().is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "supplier_name".to_string(),
            })
            .into());
        }
        for receipt in &receipts {
            validate_receipt_line(receipt).map_err(CoreError::from)?;
        }

        let invoice = PurchaseInvoice::new(invoice_number.trim(), supplier_name.trim(), receipts);
        self.db.invoices().insert(&invoice).await?;
        Ok(invoice)
    }

    /// Adds a catalog item.
    pub async fn add_item(&self, item: JewelryItem) -> LedgerResult<JewelryItem> {
        validate_item(&item).map_err(CoreError::from)?;
        self.db.items().insert(&item).await?;
        Ok(item)
    }

    // -------------------------------------------------------------------------
    // Pickers and display
    // -------------------------------------------------------------------------

    /// Invoices with metal left on at least one key.
    pub async fn list_invoices_with_available_metal(&self) -> LedgerResult<Vec<PurchaseInvoice>> {
        let invoices = self.db.invoices().list_all().await?;
        let entries = self.db.stock_entries().list_active().await?;

        Ok(invoices_with_available(&invoices, &entries)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Active catalog items whose metal key the invoice received.
    ///
    /// Fully consumed keys still match; the validator reports the shortfall.
    pub async fn list_items_matching_invoice(
        &self,
        invoice_id: &str,
    ) -> LedgerResult<Vec<JewelryItem>> {
        let available = self.get_availability(invoice_id).await?;
        let catalog = self.db.items().list_active().await?;

        Ok(items_matching(&available, &catalog)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Available weight per key for an invoice.
    pub async fn get_availability(&self, invoice_id: &str) -> LedgerResult<MetalMap> {
        let (invoice, entries) = self.load_ledger(invoice_id).await?;
        Ok(InvoiceLedger::new(&invoice, &entries).available_by_key())
    }

    /// Received / consumed / available per key, for the availability panel.
    pub async fn get_pools(&self, invoice_id: &str) -> LedgerResult<Vec<MetalPool>> {
        let (invoice, entries) = self.load_ledger(invoice_id).await?;
        Ok(InvoiceLedger::new(&invoice, &entries).pools())
    }

    /// Entries against an invoice, void included.
    pub async fn list_entries(&self, invoice_id: &str) -> LedgerResult<Vec<StockEntryMaster>> {
        Ok(self.db.stock_entries().list_for_invoice(invoice_id).await?)
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    /// Checks one line against the invoice's current availability.
    ///
    /// Returns what would remain on the item's key afterwards.
    pub async fn validate_line(
        &self,
        invoice_id: &str,
        item: &JewelryItem,
        quantity: i64,
    ) -> LedgerResult<Weight> {
        let (invoice, entries) = self.load_ledger(invoice_id).await?;
        InvoiceLedger::new(&invoice, &entries)
            .validate(item, quantity)
            .map_err(|err| self.rejected(&invoice, err))
    }

    /// Checks one line as if the draft's existing lines were committed.
    pub async fn validate_draft_line(
        &self,
        draft: &DraftStockEntry,
        item: &JewelryItem,
        quantity: i64,
    ) -> LedgerResult<Weight> {
        let invoice_id = draft.invoice_id.as_deref().ok_or(CoreError::MissingInvoice)?;
        let (invoice, entries) = self.load_ledger(invoice_id).await?;
        InvoiceLedger::new(&invoice, &entries)
            .validate_with_draft(draft, item, quantity)
            .map_err(|err| self.rejected(&invoice, err))
    }

    // -------------------------------------------------------------------------
    // Authoring and commit
    // -------------------------------------------------------------------------

    /// Reserves an entry number and returns an empty draft.
    pub async fn open_draft(&self) -> LedgerResult<DraftStockEntry> {
        Ok(self.db.stock_entries().open_draft().await?)
    }

    /// Points a draft at an invoice, recording its current revision.
    pub async fn select_invoice(
        &self,
        draft: &mut DraftStockEntry,
        invoice_id: &str,
    ) -> LedgerResult<()> {
        let revision = self
            .db
            .invoices()
            .revision(invoice_id)
            .await?
            .ok_or_else(|| unknown_invoice(invoice_id))?;
        draft.set_invoice(invoice_id, revision);
        debug!(
            entry_number = %draft.entry_number,
            invoice_id = %invoice_id,
            revision,
            "Draft invoice selected"
        );
        Ok(())
    }

    /// Validates a line against the draft's invoice and appends it.
    ///
    /// Deactivated items are refused, matching what the item picker offers.
    pub async fn add_line(
        &self,
        draft: &mut DraftStockEntry,
        item_code: &str,
        quantity: i64,
        remarks: Option<String>,
    ) -> LedgerResult<StockEntryLine> {
        let item = self
            .db
            .items()
            .get_by_code(item_code)
            .await?
            .ok_or_else(|| CoreError::UnknownItem {
                item_code: item_code.to_string(),
            })?;
        if !item.is_active {
            return Err(CoreError::InactiveItem {
                item_code: item.item_code,
            }
            .into());
        }

        self.validate_draft_line(draft, &item, quantity).await?;
        Ok(draft.add_line(&item, quantity, remarks)?.clone())
    }

    /// Commits a draft. See [`StockEntryRepository::commit`](crate::StockEntryRepository::commit).
    pub async fn commit_entry(&self, draft: &DraftStockEntry) -> LedgerResult<StockEntryMaster> {
        self.db.stock_entries().commit(draft).await
    }

    /// Voids a committed entry, returning its weight to the invoice.
    pub async fn void_entry(&self, entry_number: &str) -> LedgerResult<StockEntryMaster> {
        self.db.stock_entries().void_entry(entry_number).await
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    async fn load_ledger(
        &self,
        invoice_id: &str,
    ) -> LedgerResult<(PurchaseInvoice, Vec<StockEntryMaster>)> {
        let invoice = self
            .db
            .invoices()
            .get_by_id(invoice_id)
            .await?
            .ok_or_else(|| unknown_invoice(invoice_id))?;
        let entries = self
            .db
            .stock_entries()
            .list_active_for_invoice(invoice_id)
            .await?;
        Ok((invoice, entries))
    }

    fn rejected(&self, invoice: &PurchaseInvoice, err: CoreError) -> LedgerError {
        warn!(
            invoice_number = %invoice.invoice_number,
            error = %err,
            "Line rejected"
        );
        LedgerError::Rejected(err)
    }
}

fn unknown_invoice(invoice_id: &str) -> CoreError {
    CoreError::UnknownInvoice {
        invoice_id: invoice_id.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
