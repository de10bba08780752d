//! Data models for the FadiTools catalog

mod product;
mod snapshot;

pub use product::{
    CatalogEntry, MetaEntry, ProductCategory, ProductId, ProductImage, ProductKind, StockStatus,
};
pub use snapshot::{
    sort_newest_first, CacheSnapshot, CatalogFilter, CategoryCount, SnapshotSummary,
};

#[cfg(test)]
pub(crate) use product::sample_entry;
