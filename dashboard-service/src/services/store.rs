//! The invoice store seam: one trait, a PostgreSQL implementation and an
//! in-process mock.

use crate::models::{Invoice, InvoiceChanges, NewInvoice};
use async_trait::async_trait;
use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid invoice id: {0}")]
    InvalidId(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

/// Relational invoice store. Every method issues at most one statement.
///
/// `update` and `delete` do not distinguish "no such row" from success.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn insert(&self, invoice: &NewInvoice) -> Result<Invoice, StoreError>;
    async fn update(&self, id: &str, changes: &InvoiceChanges) -> Result<(), StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
    /// All invoices, newest date first.
    async fn list(&self) -> Result<Vec<Invoice>, StoreError>;
    async fn health_check(&self) -> Result<(), StoreError>;
}
