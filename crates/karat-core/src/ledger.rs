//! # Invoice Ledger
//!
//! Received, consumed and available metal for one purchase invoice.
//!
//! ## Derived, Never Stored
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  invoice.receipts ──► received_by_key ──┐                              │
//! │                                          ├──► available_by_key         │
//! │  active entries   ──► consumed_by_key ──┘     (received − consumed)    │
//! │  (this invoice)                                                         │
//! │                                                                         │
//! │  Every call recomputes from the receipts and the committed entries.    │
//! │  There is no balance column to drift out of step with the ledger.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Conservation holds for every key: `received == consumed + available`.

use std::collections::BTreeMap;

use crate::metal::MetalKey;
use crate::types::{MetalPool, PurchaseInvoice, StockEntryMaster};
use crate::weight::Weight;

/// Weight per normalized metal key, in key order.
pub type MetalMap = BTreeMap<MetalKey, Weight>;

/// A read-only view over one invoice and its stock entries.
///
/// `entries` may contain entries for other invoices and void entries;
/// both are ignored, so callers can pass whatever slice they loaded.
#[derive(Debug, Clone, Copy)]
pub struct InvoiceLedger<'a> {
    invoice: &'a PurchaseInvoice,
    entries: &'a [StockEntryMaster],
}

impl<'a> InvoiceLedger<'a> {
    pub fn new(invoice: &'a PurchaseInvoice, entries: &'a [StockEntryMaster]) -> Self {
        InvoiceLedger { invoice, entries }
    }

    pub fn invoice(&self) -> &'a PurchaseInvoice {
        self.invoice
    }

    /// Entries that count towards this invoice's consumption.
    pub fn active_entries(&self) -> impl Iterator<Item = &'a StockEntryMaster> + 'a {
        let invoice: &'a PurchaseInvoice = self.invoice;
        let invoice_id = invoice.id.as_str();
        self.entries
            .iter()
            .filter(move |e| e.invoice_id == invoice_id && e.is_active())
    }

    /// Total gross weight received per key.
    pub fn received_by_key(&self) -> MetalMap {
        let mut received = MetalMap::new();
        for line in &self.invoice.receipts {
            *received.entry(line.key()).or_default() += line.gross_weight;
        }
        received
    }

    /// Total weight consumed per key by active entries for this invoice.
    ///
    /// Empty when nothing has been consumed.
    pub fn consumed_by_key(&self) -> MetalMap {
        let mut consumed = MetalMap::new();
        for line in self.active_entries().flat_map(|e| e.lines.iter()) {
            *consumed.entry(line.key()).or_default() += line.weight();
        }
        consumed
    }

    /// `received − consumed` for every received key.
    ///
    /// Fully consumed keys stay in the map with zero weight; only keys that
    /// were never received are absent.
    pub fn available_by_key(&self) -> MetalMap {
        let consumed = self.consumed_by_key();
        self.received_by_key()
            .into_iter()
            .map(|(key, received)| {
                let used = consumed.get(&key).copied().unwrap_or_default();
                (key, received - used)
            })
            .collect()
    }

    /// Whether any key still has metal left.
    pub fn has_any_available(&self) -> bool {
        self.available_by_key().values().any(Weight::is_positive)
    }

    /// Per-key rows for display panels.
    ///
    /// Includes keys consumed without ever being received (which only a
    /// corrupted history can produce) so the mismatch is visible.
    pub fn pools(&self) -> Vec<MetalPool> {
        let received = self.received_by_key();
        let consumed = self.consumed_by_key();

        let mut keys: Vec<&MetalKey> = received.keys().chain(consumed.keys()).collect();
        keys.sort();
        keys.dedup();

        keys.into_iter()
            .map(|key| {
                let r = received.get(key).copied().unwrap_or_default();
                let c = consumed.get(key).copied().unwrap_or_default();
                MetalPool {
                    key: key.clone(),
                    received: r,
                    consumed: c,
                    available: r - c,
                }
            })
            .collect()
    }

    /// `received == consumed + available` for every key, and no key was
    /// consumed that was never received.
    pub fn is_conserved(&self) -> bool {
        let received = self.received_by_key();
        let consumed = self.consumed_by_key();
        let available = self.available_by_key();

        consumed.keys().all(|k| received.contains_key(k))
            && received.iter().all(|(k, r)| {
                let c = consumed.get(k).copied().unwrap_or_default();
                available.get(k).map_or(false, |a| *r == c + *a)
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
