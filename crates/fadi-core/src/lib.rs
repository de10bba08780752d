//! fadi-core - Catalog sync and cache for the FadiTools storefront
//!
//! This crate mirrors the WooCommerce product catalog into an in-process
//! snapshot, keeps it fresh with incremental delta fetches, and exports it to
//! static JSON documents. It is shared by the CLI and the HTTP API.

pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod models;
pub mod service;
pub mod snapshot_file;
pub mod store;
pub mod util;

#[cfg(test)]
mod testing;

pub use client::{CatalogSource, ProductQuery, RetryPolicy, RetryingSource, WooCommerceClient};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CatalogConfig;
pub use error::{Error, Result};
pub use models::{CacheSnapshot, CatalogEntry, CatalogFilter, ProductId};
pub use service::{CacheState, CatalogService, RefreshOutcome, SyncSettings};
pub use snapshot_file::{FileSnapshotStore, StaticCatalogReader};
pub use store::{CacheStats, CacheStore};

/// The catalog source built from environment configuration.
pub type LiveSource = RetryingSource<WooCommerceClient>;
