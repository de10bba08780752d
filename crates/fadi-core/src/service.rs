//! Catalog orchestrator: decides between serving the cache, fetching a delta,
//! or performing a cold full fetch.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::client::{CatalogSource, MAX_PAGE_SIZE};
use crate::clock::{Clock, SystemClock};
use crate::config::CatalogConfig;
use crate::fetch::{fetch_deltas, fetch_full_snapshot};
use crate::merge::merge;
use crate::models::CacheSnapshot;
use crate::store::{CacheStats, CacheStore};
use crate::{Error, Result};

/// Freshness of the cache at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    /// No snapshot yet; the next read performs a cold start
    Empty,
    /// Younger than the freshness window; served without network calls
    Fresh,
    /// At or past the freshness window; the next read fetches a delta
    Stale,
}

/// What a catalog read did to produce its snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// Cached snapshot returned as-is
    Served,
    ColdStart {
        fetched: usize,
    },
    Incremental {
        new: usize,
        updated: usize,
        total: usize,
    },
    /// Delta fetch failed; the stale snapshot was returned
    StaleFallback {
        error: String,
    },
    /// No credentials; an empty catalog was returned
    Unconfigured,
}

impl fmt::Display for RefreshOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Served => f.write_str("served from cache"),
            Self::ColdStart { fetched } => write!(f, "cold start fetched {fetched} products"),
            Self::Incremental {
                new,
                updated,
                total,
            } => write!(
                f,
                "incremental refresh: {new} new, {updated} updated, {total} total"
            ),
            Self::StaleFallback { error } => write!(f, "served stale snapshot ({error})"),
            Self::Unconfigured => f.write_str("catalog source not configured"),
        }
    }
}

/// Tunables for the sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub page_size: u32,
    pub freshness_window: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            freshness_window: Duration::hours(24),
        }
    }
}

impl SyncSettings {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            page_size: config.page_size,
            freshness_window: Duration::from_std(config.freshness_window)
                .unwrap_or_else(|_| Duration::hours(24)),
        }
    }
}

/// Serves the catalog from a [`CacheStore`], refreshing it from a
/// [`CatalogSource`] when empty or stale.
///
/// Refresh cycles are single-flight: concurrent readers that find the cache
/// empty or stale wait for the in-flight cycle and reuse its result, whether
/// it succeeded or failed.
pub struct CatalogService<S, C = SystemClock> {
    source: S,
    store: Arc<CacheStore>,
    clock: C,
    settings: SyncSettings,
    /// Guards refresh cycles and holds the failure of the last one, if any
    refresh_gate: Mutex<Option<String>>,
    /// Number of refresh cycles completed; only bumped while holding the gate
    completed_cycles: AtomicU64,
}

impl<S: CatalogSource> CatalogService<S> {
    pub fn new(source: S, store: Arc<CacheStore>, settings: SyncSettings) -> Self {
        Self::with_clock(source, store, settings, SystemClock)
    }
}

impl<S: CatalogSource, C: Clock> CatalogService<S, C> {
    pub fn with_clock(source: S, store: Arc<CacheStore>, settings: SyncSettings, clock: C) -> Self {
        Self {
            source,
            store,
            clock,
            settings,
            refresh_gate: Mutex::new(None),
            completed_cycles: AtomicU64::new(0),
        }
    }

    pub const fn source(&self) -> &S {
        &self.source
    }

    pub const fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub const fn settings(&self) -> SyncSettings {
        self.settings
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn state(&self) -> CacheState {
        self.classify(self.store.snapshot().as_deref(), self.clock.now())
    }

    /// The current catalog, refreshing first when empty or stale.
    ///
    /// Only a failed cold start is an error; a failed delta fetch serves the
    /// stale snapshot.
    pub async fn get_catalog(&self) -> Result<Arc<CacheSnapshot>> {
        self.get_catalog_with_outcome()
            .await
            .map(|(snapshot, _)| snapshot)
    }

    pub async fn get_catalog_with_outcome(&self) -> Result<(Arc<CacheSnapshot>, RefreshOutcome)> {
        if !self.source.is_configured() {
            tracing::warn!("Catalog source is not configured; serving an empty catalog");
            return Ok((
                Arc::new(CacheSnapshot::empty(self.clock.now())),
                RefreshOutcome::Unconfigured,
            ));
        }

        let seen_cycle = self.completed_cycles.load(Ordering::Acquire);
        if let Some(snapshot) = self.fresh_snapshot() {
            return Ok((snapshot, RefreshOutcome::Served));
        }

        let mut last_failure = self.refresh_gate.lock().await;
        let now = self.clock.now();
        let current = self.store.snapshot();
        let state = self.classify(current.as_deref(), now);

        if let (CacheState::Fresh, Some(snapshot)) = (state, &current) {
            return Ok((snapshot.clone(), RefreshOutcome::Served));
        }

        // A cycle failed while this caller was queued: share its result.
        if self.completed_cycles.load(Ordering::Acquire) != seen_cycle {
            if let Some(error) = last_failure.clone() {
                tracing::debug!("Reusing the failure of the refresh this caller waited on");
                return match current {
                    Some(snapshot) => Ok((snapshot, RefreshOutcome::StaleFallback { error })),
                    None => Err(Error::RefreshFailed(error)),
                };
            }
        }

        let result = match (state, current) {
            (CacheState::Stale, Some(snapshot)) => Ok(self.refresh_incremental(snapshot, now).await),
            _ => self.cold_start(now).await,
        };
        self.finish_cycle(&mut last_failure, &result);
        result
    }

    /// Drop the cache and run the cold-start path again.
    pub async fn force_refresh(&self) -> Result<Arc<CacheSnapshot>> {
        if !self.source.is_configured() {
            return Err(Error::Config(
                "catalog source is not configured; nothing to refresh".to_string(),
            ));
        }

        let mut last_failure = self.refresh_gate.lock().await;
        let had_snapshot = self.store.clear();
        tracing::info!(had_snapshot, "Forced full catalog refresh");
        let result = self.cold_start(self.clock.now()).await;
        self.finish_cycle(&mut last_failure, &result);
        result.map(|(snapshot, _)| snapshot)
    }

    /// Drop the cache without refetching. Returns whether anything was cached.
    pub fn clear_cache(&self) -> bool {
        let cleared = self.store.clear();
        tracing::info!(cleared, "Cleared catalog cache");
        cleared
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats(self.clock.now())
    }

    /// Record how a cycle ended so callers queued behind it can reuse it.
    fn finish_cycle(
        &self,
        last_failure: &mut Option<String>,
        result: &Result<(Arc<CacheSnapshot>, RefreshOutcome)>,
    ) {
        *last_failure = match result {
            Ok((_, RefreshOutcome::StaleFallback { error })) => Some(error.clone()),
            Ok(_) => None,
            Err(error) => Some(error.to_string()),
        };
        self.completed_cycles.fetch_add(1, Ordering::Release);
    }

    fn fresh_snapshot(&self) -> Option<Arc<CacheSnapshot>> {
        let snapshot = self.store.snapshot()?;
        (self.classify(Some(&snapshot), self.clock.now()) == CacheState::Fresh).then_some(snapshot)
    }

    fn classify(&self, snapshot: Option<&CacheSnapshot>, now: DateTime<Utc>) -> CacheState {
        match snapshot {
            None => CacheState::Empty,
            Some(snapshot) if now - snapshot.last_fetch_time() >= self.settings.freshness_window => {
                CacheState::Stale
            }
            Some(_) => CacheState::Fresh,
        }
    }

    async fn cold_start(&self, now: DateTime<Utc>) -> Result<(Arc<CacheSnapshot>, RefreshOutcome)> {
        let entries = fetch_full_snapshot(&self.source, self.settings.page_size)
            .await
            .inspect_err(|error| {
                tracing::error!("Cold start failed, no catalog available: {error}");
            })?;

        let fetched = entries.len();
        let snapshot = self.store.set_snapshot(entries, now);
        tracing::info!(
            fetched,
            last_seen_id = snapshot.last_seen_id(),
            "Catalog cache populated"
        );
        Ok((snapshot, RefreshOutcome::ColdStart { fetched }))
    }

    async fn refresh_incremental(
        &self,
        stale: Arc<CacheSnapshot>,
        now: DateTime<Utc>,
    ) -> (Arc<CacheSnapshot>, RefreshOutcome) {
        let watermark = stale.last_fetch_time();
        match fetch_deltas(&self.source, watermark, self.settings.page_size).await {
            Ok(delta) => {
                let merged = merge(stale.entries(), &delta.new_entries, &delta.updated_entries);
                let snapshot = self.store.set_snapshot(merged, now);
                let outcome = RefreshOutcome::Incremental {
                    new: delta.new_entries.len(),
                    updated: delta.updated_entries.len(),
                    total: snapshot.total_count(),
                };
                tracing::info!(
                    watermark = %watermark,
                    total = snapshot.total_count(),
                    "Catalog cache refreshed incrementally"
                );
                (snapshot, outcome)
            }
            Err(error) => {
                tracing::warn!(
                    watermark = %watermark,
                    entries = stale.total_count(),
                    "Incremental refresh failed, serving stale catalog: {error}"
                );
                (
                    stale,
                    RefreshOutcome::StaleFallback {
                        error: error.to_string(),
                    },
                )
            }
        }
    }
}
