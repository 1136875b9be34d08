//! The cached invoice listing served at [`INVOICES_PATH`].

use crate::services::cache::{CachedView, ViewCache, INVOICES_PATH};
use crate::services::store::{InvoiceStore, StoreError};
use std::sync::Arc;

/// Where a listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewSource {
    Hit,
    Miss,
}

impl ViewSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewSource::Hit => "hit",
            ViewSource::Miss => "miss",
        }
    }
}

/// Serve the listing from the cache, or recompute it from the store.
///
/// The generation is read before the rows are loaded, so a write that
/// lands in between makes the recomputed view uncacheable rather than
/// stale.
pub async fn invoices_view(
    store: &dyn InvoiceStore,
    cache: &dyn ViewCache,
) -> Result<(CachedView, ViewSource), StoreError> {
    if let Some(view) = cache.get(INVOICES_PATH) {
        return Ok((view, ViewSource::Hit));
    }

    let generation = cache.generation(INVOICES_PATH);
    let rows = store.list().await?;
    let body = serde_json::json!({ "invoices": rows });

    if !cache.put(INVOICES_PATH, body.clone(), generation) {
        tracing::debug!(generation, "Listing revalidated while loading; not cached");
    }

    Ok((
        CachedView {
            body: Arc::new(body),
            generation,
        },
        ViewSource::Miss,
    ))
}
