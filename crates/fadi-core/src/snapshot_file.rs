//! Static snapshot documents on disk and the read policy over them.
//!
//! An export writes two documents into a directory: the full product list and
//! a small metadata summary. Readers prefer those files and fall back to a
//! live [`CatalogService`] when the files are missing, unreadable, or stale.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::CatalogSource;
use crate::clock::Clock;
use crate::config::DEFAULT_SNAPSHOT_MAX_AGE;
use crate::models::{CacheSnapshot, CatalogEntry, SnapshotSummary};
use crate::service::CatalogService;
use crate::Result;

pub const PRODUCTS_FILE_NAME: &str = "products.json";
pub const METADATA_FILE_NAME: &str = "products-metadata.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsDocument {
    pub products: Vec<CatalogEntry>,
    pub total_products: usize,
    /// When the catalog data was fetched from the store
    pub last_updated: DateTime<Utc>,
    /// When this document was written
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDocument {
    #[serde(flatten)]
    pub summary: SnapshotSummary,
    /// Human-readable form of the data's fetch time
    pub last_updated: String,
    pub fetched_at: DateTime<Utc>,
}

/// Paths of a written document pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    pub products: PathBuf,
    pub metadata: PathBuf,
}

/// Write both snapshot documents into `dir`, creating it if needed.
///
/// Each file is written to a temporary sibling and renamed into place, so a
/// concurrent reader sees either the previous document or the new one.
pub fn write_snapshot_files(
    dir: &Path,
    snapshot: &CacheSnapshot,
    now: DateTime<Utc>,
) -> Result<WrittenFiles> {
    fs::create_dir_all(dir)?;

    let products = ProductsDocument {
        products: snapshot.entries().to_vec(),
        total_products: snapshot.total_count(),
        last_updated: snapshot.last_fetch_time(),
        fetched_at: now,
    };
    let metadata = MetadataDocument {
        summary: snapshot.summary(),
        last_updated: human_readable(snapshot.last_fetch_time()),
        fetched_at: now,
    };

    let written = WrittenFiles {
        products: dir.join(PRODUCTS_FILE_NAME),
        metadata: dir.join(METADATA_FILE_NAME),
    };
    write_atomically(&written.products, &serde_json::to_vec_pretty(&products)?)?;
    write_atomically(&written.metadata, &serde_json::to_vec_pretty(&metadata)?)?;

    tracing::info!(
        dir = %dir.display(),
        products = products.total_products,
        "Wrote catalog snapshot files"
    );
    Ok(written)
}

fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, contents)?;
    fs::rename(&temp_path, path).inspect_err(|_| {
        let _ = fs::remove_file(&temp_path);
    })
}

fn human_readable(instant: DateTime<Utc>) -> String {
    instant.format("%B %-d, %Y at %H:%M UTC").to_string()
}

/// Reader over a directory of exported snapshot documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshotStore {
    dir: PathBuf,
    max_age: Duration,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_age: DEFAULT_SNAPSHOT_MAX_AGE,
        }
    }

    #[must_use]
    pub const fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub const fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn products_path(&self) -> PathBuf {
        self.dir.join(PRODUCTS_FILE_NAME)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE_NAME)
    }

    /// The products document, or `None` when no export exists yet.
    pub fn load(&self) -> Result<Option<ProductsDocument>> {
        read_document(&self.products_path())
    }

    pub fn load_metadata(&self) -> Result<Option<MetadataDocument>> {
        read_document(&self.metadata_path())
    }

    /// The exported catalog as a snapshot stamped with its original fetch time.
    pub fn load_snapshot(&self) -> Result<Option<CacheSnapshot>> {
        Ok(self
            .load()?
            .map(|document| CacheSnapshot::new(document.products, document.last_updated)))
    }

    pub fn is_stale(&self, snapshot: &CacheSnapshot, now: DateTime<Utc>) -> bool {
        (now - snapshot.last_fetch_time())
            .to_std()
            .is_ok_and(|age| age > self.max_age)
    }

    /// File data regardless of age; empty when missing or unreadable.
    pub fn read_or_empty(&self, now: DateTime<Utc>) -> CacheSnapshot {
        self.load_logged()
            .unwrap_or_else(|| CacheSnapshot::empty(now))
    }

    fn load_logged(&self) -> Option<CacheSnapshot> {
        match self.load_snapshot() {
            Ok(Some(snapshot)) => Some(snapshot),
            Ok(None) => {
                tracing::debug!(
                    path = %self.products_path().display(),
                    "No catalog snapshot file"
                );
                None
            }
            Err(error) => {
                tracing::error!(
                    path = %self.products_path().display(),
                    "Failed to read catalog snapshot file: {error}"
                );
                None
            }
        }
    }
}

fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(error.into()),
    };
    Ok(Some(serde_json::from_slice(&raw)?))
}

/// Serves the catalog from exported files, falling back to a live service.
///
/// Never fails: errors are logged and degrade to the next source, ending in
/// an empty catalog.
pub struct StaticCatalogReader<'a, S, C = crate::clock::SystemClock> {
    files: &'a FileSnapshotStore,
    live: Option<&'a CatalogService<S, C>>,
}

impl<'a, S: CatalogSource, C: Clock> StaticCatalogReader<'a, S, C> {
    pub const fn new(files: &'a FileSnapshotStore) -> Self {
        Self { files, live: None }
    }

    #[must_use]
    pub const fn with_live(mut self, service: &'a CatalogService<S, C>) -> Self {
        self.live = Some(service);
        self
    }

    /// Fresh file data when available, otherwise live data, otherwise
    /// whatever the files hold, otherwise an empty catalog.
    pub async fn read(&self, now: DateTime<Utc>) -> Arc<CacheSnapshot> {
        let from_file = self.files.load_logged();

        if let Some(snapshot) = &from_file {
            if !self.files.is_stale(snapshot, now) {
                return Arc::new(snapshot.clone());
            }
        }

        if let Some(service) = self.live.filter(|service| service.source().is_configured()) {
            match service.get_catalog().await {
                Ok(snapshot) => return snapshot,
                Err(error) => {
                    tracing::error!("Live catalog fallback failed: {error}");
                }
            }
        }

        match from_file {
            Some(snapshot) => {
                tracing::warn!(
                    dir = %self.files.dir().display(),
                    last_updated = %snapshot.last_fetch_time(),
                    "Serving stale catalog snapshot file"
                );
                Arc::new(snapshot)
            }
            None => Arc::new(CacheSnapshot::empty(now)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::clock::ManualClock;
    use crate::models::sample_entry;
    use crate::service::SyncSettings;
    use crate::store::CacheStore;
    use crate::testing::FakeCatalog;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 10, 8, 30, 0).unwrap()
    }

    fn exported(dir: &Path, ids: &[u64], fetched: DateTime<Utc>) -> CacheSnapshot {
        let snapshot = CacheSnapshot::new(
            ids.iter()
                .map(|id| sample_entry(*id, fetched - chrono::Duration::days(3)))
                .collect(),
            fetched,
        );
        write_snapshot_files(dir, &snapshot, fetched).unwrap();
        snapshot
    }

    fn live_service(count: u64) -> CatalogService<FakeCatalog, ManualClock> {
        CatalogService::with_clock(
            FakeCatalog::with_products(count, t0() - chrono::Duration::days(60)),
            Arc::new(CacheStore::new()),
            SyncSettings::default(),
            ManualClock::new(t0()),
        )
    }

    #[test]
    fn written_documents_use_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        exported(dir.path(), &[1, 2], t0());

        let products: serde_json::Value =
            serde_json::from_slice(&fs::read(dir.path().join(PRODUCTS_FILE_NAME)).unwrap())
                .unwrap();
        assert_eq!(products["totalProducts"], 2);
        assert_eq!(products["lastUpdated"], "2024-09-10T08:30:00Z");
        assert!(products["products"][0]["shortDescription"].is_string());

        let metadata: serde_json::Value =
            serde_json::from_slice(&fs::read(dir.path().join(METADATA_FILE_NAME)).unwrap())
                .unwrap();
        assert_eq!(metadata["totalProducts"], 2);
        assert_eq!(metadata["inStockCount"], 2);
        assert_eq!(metadata["lastUpdated"], "September 10, 2024 at 08:30 UTC");
        assert!(!dir.path().join("products.json.tmp").exists());
    }

    #[test]
    fn load_restores_snapshot_with_original_fetch_time() {
        let dir = tempfile::tempdir().unwrap();
        let original = exported(dir.path(), &[3, 1, 2], t0());

        let store = FileSnapshotStore::new(dir.path());
        let loaded = store.load_snapshot().unwrap().unwrap();
        assert_eq!(loaded, original);
        assert_eq!(
            store.load_metadata().unwrap().unwrap().summary,
            original.summary()
        );
    }

    #[test]
    fn missing_file_loads_as_none_and_garbage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        assert!(store.load().unwrap().is_none());

        fs::write(store.products_path(), "{ not json").unwrap();
        assert!(store.load().is_err());
        assert!(store.read_or_empty(t0()).is_empty());
    }

    #[test]
    fn staleness_follows_max_age() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = exported(dir.path(), &[1], t0());
        let store = FileSnapshotStore::new(dir.path()).with_max_age(Duration::from_secs(3_600));

        assert!(!store.is_stale(&snapshot, t0() + chrono::Duration::minutes(60)));
        assert!(store.is_stale(&snapshot, t0() + chrono::Duration::minutes(61)));
    }

    #[test]
    fn default_max_age_matches_config_default() {
        let store = FileSnapshotStore::new("/tmp/catalog");
        assert_eq!(store.max_age(), crate::CatalogConfig::default().snapshot_max_age);
        assert_eq!(store.max_age(), Duration::from_secs(24 * 3_600));
    }

    #[tokio::test]
    async fn fresh_file_is_served_without_live_calls() {
        let dir = tempfile::tempdir().unwrap();
        exported(dir.path(), &[1, 2], t0());
        let files = FileSnapshotStore::new(dir.path());
        let service = live_service(5);

        let catalog = StaticCatalogReader::new(&files)
            .with_live(&service)
            .read(t0() + chrono::Duration::hours(1))
            .await;
        assert_eq!(catalog.total_count(), 2);
        assert_eq!(service.source().call_count(), 0);
    }

    #[tokio::test]
    async fn missing_file_falls_back_to_live_service() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileSnapshotStore::new(dir.path());
        let service = live_service(5);

        let catalog = StaticCatalogReader::new(&files)
            .with_live(&service)
            .read(t0())
            .await;
        assert_eq!(catalog.total_count(), 5);
    }

    #[tokio::test]
    async fn stale_file_is_replaced_by_live_data() {
        let dir = tempfile::tempdir().unwrap();
        exported(dir.path(), &[1], t0() - chrono::Duration::days(3));
        let files = FileSnapshotStore::new(dir.path());
        let service = live_service(4);

        let catalog = StaticCatalogReader::new(&files)
            .with_live(&service)
            .read(t0())
            .await;
        assert_eq!(catalog.total_count(), 4);
    }

    #[tokio::test]
    async fn stale_file_is_served_when_live_source_fails_or_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        exported(dir.path(), &[1, 2, 3], t0() - chrono::Duration::days(3));
        let files = FileSnapshotStore::new(dir.path());

        let without_live = StaticCatalogReader::<FakeCatalog>::new(&files)
            .read(t0())
            .await;
        assert_eq!(without_live.total_count(), 3);

        let service = live_service(5);
        service.source().fail_from_call(1, 500);
        let with_failing_live = StaticCatalogReader::new(&files)
            .with_live(&service)
            .read(t0())
            .await;
        assert_eq!(with_failing_live.total_count(), 3);
    }

    #[tokio::test]
    async fn nothing_available_yields_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileSnapshotStore::new(dir.path().join("missing"));
        let service = CatalogService::with_clock(
            FakeCatalog::unconfigured(),
            Arc::new(CacheStore::new()),
            SyncSettings::default(),
            ManualClock::new(t0()),
        );

        let catalog = StaticCatalogReader::new(&files)
            .with_live(&service)
            .read(t0())
            .await;
        assert!(catalog.is_empty());
        assert_eq!(service.source().call_count(), 0);
    }
}
