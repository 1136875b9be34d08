//! In-process invoice store.
//!
//! Used by tests and as the development fallback when no `DATABASE_URL`
//! is configured. A [`MockInvoiceStore::recording`] store also keeps a log
//! of every statement it receives; the fallback store does not.

use crate::models::{Invoice, InvoiceChanges, NewInvoice};
use crate::services::store::{InvoiceStore, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// A statement the mock store was asked to run.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Insert(NewInvoice),
    Update { id: String, changes: InvoiceChanges },
    Delete(String),
    List,
}

#[derive(Default)]
pub struct MockInvoiceStore {
    rows: DashMap<Uuid, Invoice>,
    calls: Mutex<Vec<StoreCall>>,
    record_calls: bool,
    failing: AtomicBool,
}

impl MockInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that logs every statement for [`MockInvoiceStore::calls`].
    pub fn recording() -> Self {
        Self {
            record_calls: true,
            ..Self::default()
        }
    }

    /// A recording store whose every call fails, as an unreachable
    /// database would.
    pub fn failing() -> Self {
        let store = Self::recording();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Statements that would change data (everything except reads).
    pub fn write_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| !matches!(c, StoreCall::List))
            .count()
    }

    pub fn rows(&self) -> Vec<Invoice> {
        self.rows.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn get(&self, id: Uuid) -> Option<Invoice> {
        self.rows.get(&id).map(|entry| entry.value().clone())
    }

    fn record(&self, call: StoreCall) -> Result<(), StoreError> {
        if self.record_calls {
            self.calls
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(call);
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "mock store is configured to fail".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_id(id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

#[async_trait]
impl InvoiceStore for MockInvoiceStore {
    async fn insert(&self, invoice: &NewInvoice) -> Result<Invoice, StoreError> {
        self.record(StoreCall::Insert(invoice.clone()))?;

        let row = Invoice {
            id: Uuid::new_v4(),
            customer_id: invoice.customer_id.clone(),
            amount: invoice.amount_in_cents,
            status: invoice.status.as_str().to_string(),
            date: invoice.date,
        };
        self.rows.insert(row.id, row.clone());

        tracing::info!(invoice_id = %row.id, "[MOCK] Invoice inserted");

        Ok(row)
    }

    async fn update(&self, id: &str, changes: &InvoiceChanges) -> Result<(), StoreError> {
        self.record(StoreCall::Update {
            id: id.to_string(),
            changes: changes.clone(),
        })?;

        let invoice_id = parse_id(id)?;
        if let Some(mut row) = self.rows.get_mut(&invoice_id) {
            row.customer_id = changes.customer_id.clone();
            row.amount = changes.amount_in_cents;
            row.status = changes.status.as_str().to_string();
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.record(StoreCall::Delete(id.to_string()))?;

        let invoice_id = parse_id(id)?;
        self.rows.remove(&invoice_id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Invoice>, StoreError> {
        self.record(StoreCall::List)?;

        let mut rows = self.rows();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "mock store is configured to fail".to_string(),
            ));
        }
        Ok(())
    }
}
