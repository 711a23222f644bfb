//! # Invoice Locks
//!
//! Serializes commits and voids against the same invoice.
//!
//! ```text
//! commit(SE-7 → PI-001) ──► acquire("PI-001") ──► recompute → validate → persist
//! commit(SE-8 → PI-001) ──► acquire("PI-001") ──► (waits for SE-7)
//! commit(SE-9 → PI-002) ──► acquire("PI-002") ──► runs immediately
//! ```
//!
//! This covers sessions sharing one `Database`. Across processes the
//! revision bump at the start of every commit transaction takes SQLite's
//! write lock, so the check-then-insert still cannot interleave.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Per-invoice async mutexes, created on demand.
#[derive(Debug, Default)]
pub struct InvoiceLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held for the duration of one commit or void.
#[derive(Debug)]
pub struct InvoiceGuard {
    invoice_id: String,
    _guard: OwnedMutexGuard<()>,
}

impl InvoiceGuard {
    pub fn invoice_id(&self) -> &str {
        &self.invoice_id
    }
}

impl InvoiceLocks {
    pub fn new() -> Self {
        InvoiceLocks::default()
    }

    /// Waits until no one else holds the invoice, then holds it.
    pub async fn acquire(&self, invoice_id: &str) -> InvoiceGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop mutexes nobody holds or waits on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(invoice_id.to_string()).or_default().clone()
        };

        debug!(invoice_id = %invoice_id, "Waiting for invoice lock");
        let guard = lock.lock_owned().await;
        debug!(invoice_id = %invoice_id, "Invoice lock acquired");

        InvoiceGuard {
            invoice_id: invoice_id.to_string(),
            _guard: guard,
        }
    }

    /// Number of invoices currently tracked.
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_same_invoice_waits() {
        let locks = Arc::new(InvoiceLocks::new());
        let acquired = Arc::new(AtomicBool::new(false));

        let first = locks.acquire("PI-001").await;

        let task = {
            let locks = Arc::clone(&locks);
            let acquired = Arc::clone(&acquired);
            tokio::spawn(async move {
                let _second = locks.acquire("PI-001").await;
                acquired.store(true, Ordering::SeqCst);
            })
        };

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!acquired.load(Ordering::SeqCst));

        drop(first);
        task.await.unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_different_invoices_are_independent() {
        let locks = InvoiceLocks::new();
        let a = locks.acquire("PI-001").await;
        let b = locks.acquire("PI-002").await;
        assert_eq!(a.invoice_id(), "PI-001");
        assert_eq!(b.invoice_id(), "PI-002");
    }

    #[tokio::test]
    async fn test_released_locks_are_pruned() {
        let locks = InvoiceLocks::new();
        drop(locks.acquire("PI-001").await);
        drop(locks.acquire("PI-002").await);
        let _held = locks.acquire("PI-003").await;
        assert_eq!(locks.tracked(), 1);
    }
}
