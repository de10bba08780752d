use std::path::PathBuf;
use std::sync::Arc;

use fadi_core::fetch::fetch_by_slug;
use fadi_core::util;
use fadi_core::{
    CacheSnapshot, CacheStore, CatalogConfig, CatalogEntry, CatalogService, CatalogSource,
    FileSnapshotStore, LiveSource, StaticCatalogReader, SyncSettings,
};
use serde::Serialize;

use crate::error::CliError;

/// Everything a command needs to reach the catalog.
#[derive(Debug, Clone)]
pub struct CatalogContext {
    pub config: CatalogConfig,
    pub snapshot_dir: Option<PathBuf>,
}

impl CatalogContext {
    /// `--snapshot-dir` wins over `CATALOG_SNAPSHOT_DIR`, which wins over the
    /// platform data directory.
    pub fn new(config: CatalogConfig, snapshot_dir_override: Option<PathBuf>) -> Self {
        let snapshot_dir = snapshot_dir_override
            .or_else(|| config.snapshot_dir.clone())
            .or_else(default_snapshot_dir);
        Self {
            config,
            snapshot_dir,
        }
    }

    pub fn files(&self) -> Result<FileSnapshotStore, CliError> {
        let dir = self.snapshot_dir.clone().ok_or(CliError::NoSnapshotDir)?;
        Ok(FileSnapshotStore::new(dir).with_max_age(self.config.snapshot_max_age))
    }

    pub fn service(&self) -> Result<CatalogService<LiveSource>, CliError> {
        Ok(CatalogService::new(
            self.config.build_source()?,
            Arc::new(CacheStore::new()),
            SyncSettings::from_config(&self.config),
        ))
    }
}

pub fn default_snapshot_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("faditools"))
}

/// The catalog from the exported files (with live fallback) or straight from
/// the store.
pub async fn load_catalog<S: CatalogSource>(
    files: Option<&FileSnapshotStore>,
    service: &CatalogService<S>,
    from_file: bool,
) -> Result<Arc<CacheSnapshot>, CliError> {
    match (from_file, files) {
        (true, Some(files)) => Ok(StaticCatalogReader::new(files)
            .with_live(service)
            .read(service.now())
            .await),
        (true, None) => Err(CliError::NoSnapshotDir),
        (false, _) => Ok(service.get_catalog().await?),
    }
}

/// Resolve a product by slug, asking the store directly when the snapshot
/// does not have it.
pub async fn find_product<S: CatalogSource>(
    snapshot: &CacheSnapshot,
    service: &CatalogService<S>,
    slug: &str,
) -> Result<CatalogEntry, CliError> {
    let slug = normalize_slug(slug)?;
    if let Some(entry) = snapshot.by_slug(&slug) {
        return Ok(entry.clone());
    }

    if service.source().is_configured() {
        if let Some(entry) = fetch_by_slug(service.source(), &slug).await? {
            return Ok(entry);
        }
    }
    Err(CliError::ProductNotFound(slug))
}

pub fn normalize_slug(raw: &str) -> Result<String, CliError> {
    util::normalize_slug(raw).ok_or(CliError::EmptySlug)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductListItem {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub price: Option<String>,
    pub regular_price: Option<String>,
    pub on_sale: bool,
    pub featured: bool,
    pub stock_status: String,
    pub categories: Vec<String>,
    pub image: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub item: ProductListItem,
    pub sku: Option<String>,
    pub summary: String,
    pub discount_percent: Option<u8>,
    pub related: Vec<ProductListItem>,
}

pub fn product_to_list_item(entry: &CatalogEntry) -> ProductListItem {
    ProductListItem {
        id: entry.id,
        name: entry.name.clone(),
        slug: entry.slug.clone(),
        price: entry.price.clone(),
        regular_price: entry.regular_price.clone(),
        on_sale: entry.on_sale,
        featured: entry.featured,
        stock_status: entry.stock_status.to_string(),
        categories: entry
            .categories
            .iter()
            .map(|category| category.name.clone())
            .collect(),
        image: entry.primary_image().map(|image| image.src.clone()),
        link: entry
            .affiliate_url()
            .map(str::to_string)
            .or_else(|| entry.permalink.clone()),
    }
}

pub fn product_to_detail(entry: &CatalogEntry, related: &[&CatalogEntry]) -> ProductDetail {
    ProductDetail {
        item: product_to_list_item(entry),
        sku: entry.sku.clone(),
        summary: entry.plain_short_description(),
        discount_percent: entry.discount_percent(),
        related: related
            .iter()
            .map(|entry| product_to_list_item(entry))
            .collect(),
    }
}

pub fn format_product_lines(entries: &[&CatalogEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let name = truncate(&entry.name, 40);
            let price = format_price(entry);
            let stock = entry.stock_status.as_str();
            let flags = render_flags(entry);
            if flags.is_empty() {
                format!("{:>6}  {name:<40}  {price:<22}  {stock}", entry.id)
            } else {
                format!("{:>6}  {name:<40}  {price:<22}  {stock:<12}  {flags}", entry.id)
            }
        })
        .collect()
}

pub fn format_price(entry: &CatalogEntry) -> String {
    match (entry.price.as_deref(), entry.regular_price.as_deref()) {
        (None, _) => "-".to_string(),
        (Some(price), Some(regular)) if entry.on_sale && regular != price => {
            format!("{price} (was {regular})")
        }
        (Some(price), _) => price.to_string(),
    }
}

fn render_flags(entry: &CatalogEntry) -> String {
    let mut flags = Vec::new();
    if entry.featured {
        flags.push("featured");
    }
    if entry.on_sale {
        flags.push("sale");
    }
    flags.join(",")
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let mut truncated = collapsed
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}
