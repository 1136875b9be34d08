//! Path-keyed cache for computed dashboard views.
//!
//! Mutations call [`ViewCache::revalidate_path`] after a successful write;
//! the next read of that path recomputes the view from the store.

use crate::services::metrics::{CACHE_LOOKUPS_TOTAL, CACHE_REVALIDATIONS_TOTAL};
use dashmap::DashMap;
use std::sync::Arc;

/// Path of the invoice listing view.
pub const INVOICES_PATH: &str = "/dashboard/invoices";

/// A computed view, tagged with the generation it was computed at.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedView {
    pub body: Arc<serde_json::Value>,
    pub generation: u64,
}

pub trait ViewCache: Send + Sync {
    /// Mark whatever is cached for `path` as stale. Never fails.
    fn revalidate_path(&self, path: &str);

    /// The fresh view for `path`, if any.
    fn get(&self, path: &str) -> Option<CachedView>;

    /// Current generation of `path`. Read it before computing a view.
    fn generation(&self, path: &str) -> u64;

    /// Store a view computed at `generation`. Returns `false` (and drops the
    /// view) when the path was revalidated while the view was computed.
    fn put(&self, path: &str, body: serde_json::Value, generation: u64) -> bool;
}

#[derive(Debug, Default)]
struct Entry {
    generation: u64,
    view: Option<Arc<serde_json::Value>>,
}

/// In-process [`ViewCache`] backed by a concurrent map.
#[derive(Debug, Default)]
pub struct PathCache {
    entries: DashMap<String, Entry>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `path` has been revalidated since startup.
    pub fn revalidation_count(&self, path: &str) -> u64 {
        self.generation(path)
    }
}

impl ViewCache for PathCache {
    fn revalidate_path(&self, path: &str) {
        let mut entry = self.entries.entry(path.to_string()).or_default();
        entry.generation += 1;
        entry.view = None;

        CACHE_REVALIDATIONS_TOTAL.with_label_values(&[path]).inc();
        tracing::debug!(path, generation = entry.generation, "View revalidated");
    }

    fn get(&self, path: &str) -> Option<CachedView> {
        let view = self.entries.get(path).and_then(|entry| {
            entry.view.as_ref().map(|body| CachedView {
                body: Arc::clone(body),
                generation: entry.generation,
            })
        });

        let result = if view.is_some() { "hit" } else { "miss" };
        CACHE_LOOKUPS_TOTAL.with_label_values(&[result]).inc();

        view
    }

    fn generation(&self, path: &str) -> u64 {
        self.entries.get(path).map(|e| e.generation).unwrap_or(0)
    }

    fn put(&self, path: &str, body: serde_json::Value, generation: u64) -> bool {
        let mut entry = self.entries.entry(path.to_string()).or_default();
        if entry.generation != generation {
            return false;
        }
        entry.view = Some(Arc::new(body));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn put_then_get_returns_view() {
        let cache = PathCache::new();
        let generation = cache.generation(INVOICES_PATH);
        assert!(cache.put(INVOICES_PATH, json!([1, 2]), generation));

        let view = cache.get(INVOICES_PATH).unwrap();
        assert_eq!(*view.body, json!([1, 2]));
        assert_eq!(view.generation, 0);
    }

    #[test]
    fn revalidation_drops_the_cached_view() {
        let cache = PathCache::new();
        cache.put(INVOICES_PATH, json!([]), 0);

        cache.revalidate_path(INVOICES_PATH);

        assert!(cache.get(INVOICES_PATH).is_none());
        assert_eq!(cache.revalidation_count(INVOICES_PATH), 1);
    }

    #[test]
    fn view_computed_before_a_revalidation_is_discarded() {
        let cache = PathCache::new();
        let generation = cache.generation(INVOICES_PATH);

        // A write lands while the reader is still loading rows.
        cache.revalidate_path(INVOICES_PATH);

        assert!(!cache.put(INVOICES_PATH, json!(["stale"]), generation));
        assert!(cache.get(INVOICES_PATH).is_none());
    }

    #[test]
    fn paths_are_independent() {
        let cache = PathCache::new();
        cache.put("/dashboard", json!({}), 0);
        cache.revalidate_path(INVOICES_PATH);

        assert!(cache.get("/dashboard").is_some());
        assert_eq!(cache.revalidation_count("/dashboard"), 0);
    }
}
