//! Catalog snapshot model and read-side queries

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::product::{CatalogEntry, ProductCategory, ProductId, StockStatus};
use crate::util::normalize_slug;

/// A complete copy of the catalog at a point in time.
///
/// Entries are kept newest-first by creation date; ties fall back to the
/// higher id first so the ordering is total.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSnapshot {
    entries: Vec<CatalogEntry>,
    last_fetch_time: DateTime<Utc>,
    last_seen_id: Option<ProductId>,
}

/// Aggregate counts over a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub total_products: usize,
    pub featured_count: usize,
    pub on_sale_count: usize,
    pub in_stock_count: usize,
    pub out_of_stock_count: usize,
    pub on_backorder_count: usize,
    pub category_count: usize,
}

/// A category and the number of products filed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub product_count: usize,
}

/// Listing filter shared by the CLI and the HTTP surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    /// Category slug or numeric id
    pub category: Option<String>,
    pub on_sale: bool,
    pub featured: bool,
    pub in_stock: bool,
    pub search: Option<String>,
}

impl CatalogFilter {
    #[must_use]
    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        if let Some(category) = self.category.as_deref() {
            if !entry.in_category(category) {
                return false;
            }
        }
        if self.on_sale && !entry.on_sale {
            return false;
        }
        if self.featured && !entry.featured {
            return false;
        }
        if self.in_stock && !entry.is_in_stock() {
            return false;
        }
        // A blank search term places no constraint.
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map_or(true, |term| matches_search(entry, &term.to_lowercase()))
    }

    /// Matching entries in snapshot order.
    #[must_use]
    pub fn apply<'a>(&self, snapshot: &'a CacheSnapshot) -> Vec<&'a CatalogEntry> {
        snapshot
            .entries()
            .iter()
            .filter(|entry| self.matches(entry))
            .collect()
    }
}

/// Sort entries newest-first by creation date, then by id descending.
pub fn sort_newest_first(entries: &mut [CatalogEntry]) {
    entries.sort_by(|a, b| {
        b.date_created
            .cmp(&a.date_created)
            .then_with(|| b.id.cmp(&a.id))
    });
}

impl CacheSnapshot {
    /// Build a snapshot, ordering the entries newest-first.
    #[must_use]
    pub fn new(mut entries: Vec<CatalogEntry>, last_fetch_time: DateTime<Utc>) -> Self {
        sort_newest_first(&mut entries);
        let last_seen_id = entries.iter().map(|entry| entry.id).max();
        Self {
            entries,
            last_fetch_time,
            last_seen_id,
        }
    }

    #[must_use]
    pub fn empty(last_fetch_time: DateTime<Utc>) -> Self {
        Self::new(Vec::new(), last_fetch_time)
    }

    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Wall-clock instant of the last successful fetch cycle
    #[must_use]
    pub const fn last_fetch_time(&self) -> DateTime<Utc> {
        self.last_fetch_time
    }

    /// Highest id observed; informational only
    #[must_use]
    pub const fn last_seen_id(&self) -> Option<ProductId> {
        self.last_seen_id
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lowest id present, for cache statistics.
    #[must_use]
    pub fn first_id(&self) -> Option<ProductId> {
        self.entries.iter().map(|entry| entry.id).min()
    }

    #[must_use]
    pub fn by_id(&self, id: ProductId) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// First entry with the given slug in snapshot order. The slug is
    /// normalized first, so `/Hammer-Drill/` finds `hammer-drill`.
    #[must_use]
    pub fn by_slug(&self, slug: &str) -> Option<&CatalogEntry> {
        let slug = normalize_slug(slug)?;
        self.entries
            .iter()
            .find(|entry| entry.slug.eq_ignore_ascii_case(&slug))
    }

    #[must_use]
    pub fn by_category(&self, selector: &str) -> Vec<&CatalogEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.in_category(selector))
            .collect()
    }

    #[must_use]
    pub fn featured(&self) -> Vec<&CatalogEntry> {
        self.entries.iter().filter(|entry| entry.featured).collect()
    }

    #[must_use]
    pub fn on_sale(&self) -> Vec<&CatalogEntry> {
        self.entries.iter().filter(|entry| entry.on_sale).collect()
    }

    #[must_use]
    pub fn in_stock(&self) -> Vec<&CatalogEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.is_in_stock())
            .collect()
    }

    /// Case-insensitive match over name, sku, short description and
    /// category names. A blank term matches nothing.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&CatalogEntry> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|entry| matches_search(entry, &term))
            .collect()
    }

    /// Products sharing at least one category with `entry`, excluding itself.
    #[must_use]
    pub fn related(&self, entry: &CatalogEntry, limit: usize) -> Vec<&CatalogEntry> {
        self.entries
            .iter()
            .filter(|candidate| candidate.id != entry.id)
            .filter(|candidate| {
                candidate
                    .categories
                    .iter()
                    .any(|category| entry.categories.iter().any(|own| own.id == category.id))
            })
            .take(limit)
            .collect()
    }

    /// Distinct categories with product counts, ordered by name.
    #[must_use]
    pub fn categories(&self) -> Vec<CategoryCount> {
        let mut counts: BTreeMap<u64, (&ProductCategory, usize)> = BTreeMap::new();
        for category in self.entries.iter().flat_map(|entry| &entry.categories) {
            counts.entry(category.id).or_insert((category, 0)).1 += 1;
        }

        let mut categories = counts
            .into_values()
            .map(|(category, product_count)| CategoryCount {
                id: category.id,
                name: category.name.clone(),
                slug: category.slug.clone(),
                product_count,
            })
            .collect::<Vec<_>>();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        categories
    }

    #[must_use]
    pub fn summary(&self) -> SnapshotSummary {
        let mut summary = SnapshotSummary {
            total_products: self.entries.len(),
            category_count: self.categories().len(),
            ..SnapshotSummary::default()
        };
        for entry in &self.entries {
            if entry.featured {
                summary.featured_count += 1;
            }
            if entry.on_sale {
                summary.on_sale_count += 1;
            }
            match entry.stock_status {
                StockStatus::InStock => summary.in_stock_count += 1,
                StockStatus::OutOfStock => summary.out_of_stock_count += 1,
                StockStatus::OnBackorder => summary.on_backorder_count += 1,
            }
        }
        summary
    }
}

fn matches_search(entry: &CatalogEntry, term: &str) -> bool {
    entry.name.to_lowercase().contains(term)
        || entry
            .sku
            .as_deref()
            .is_some_and(|sku| sku.to_lowercase().contains(term))
        || entry
            .plain_short_description()
            .to_lowercase()
            .contains(term)
        || entry
            .categories
            .iter()
            .any(|category| category.name.to_lowercase().contains(term))
}
