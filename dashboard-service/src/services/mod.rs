//! Services module for dashboard-service.

pub mod cache;
pub mod database;
pub mod listing;
pub mod metrics;
pub mod mock;
pub mod store;

pub use cache::{CachedView, PathCache, ViewCache, INVOICES_PATH};
pub use database::PgInvoiceStore;
pub use listing::{invoices_view, ViewSource};
pub use metrics::{get_metrics, init_metrics};
pub use mock::{MockInvoiceStore, StoreCall};
pub use store::{InvoiceStore, StoreError};
