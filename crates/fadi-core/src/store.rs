//! In-process cache store holding the current catalog snapshot.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{CacheSnapshot, CatalogEntry, ProductId};

/// Holds at most one snapshot.
///
/// Replacing the snapshot is a single pointer swap, so readers holding an
/// `Arc` from [`CacheStore::snapshot`] keep a consistent view while a newer
/// snapshot is installed.
#[derive(Debug, Default)]
pub struct CacheStore {
    current: RwLock<Option<Arc<CacheSnapshot>>>,
}

/// Operational view of a cache store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub populated: bool,
    pub entry_count: usize,
    pub last_fetch_time: Option<DateTime<Utc>>,
    /// Seconds since the last successful fetch
    pub age_secs: Option<i64>,
    pub min_id: Option<ProductId>,
    pub max_id: Option<ProductId>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, if the store has been populated.
    pub fn snapshot(&self) -> Option<Arc<CacheSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install a new snapshot built from `entries`.
    pub fn set_snapshot(
        &self,
        entries: Vec<CatalogEntry>,
        fetch_time: DateTime<Utc>,
    ) -> Arc<CacheSnapshot> {
        self.replace(CacheSnapshot::new(entries, fetch_time))
    }

    pub fn replace(&self, snapshot: CacheSnapshot) -> Arc<CacheSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        snapshot
    }

    /// Drop the snapshot. Returns whether anything was cached.
    pub fn clear(&self) -> bool {
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    pub fn stats(&self, now: DateTime<Utc>) -> CacheStats {
        self.snapshot().map_or(
            CacheStats {
                populated: false,
                entry_count: 0,
                last_fetch_time: None,
                age_secs: None,
                min_id: None,
                max_id: None,
            },
            |snapshot| CacheStats {
                populated: true,
                entry_count: snapshot.total_count(),
                last_fetch_time: Some(snapshot.last_fetch_time()),
                age_secs: Some((now - snapshot.last_fetch_time()).num_seconds()),
                min_id: snapshot.first_id(),
                max_id: snapshot.last_seen_id(),
            },
        )
    }
}
