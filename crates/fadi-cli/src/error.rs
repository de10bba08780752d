use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] fadi_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Product slug cannot be empty")]
    EmptySlug,
    #[error("Product not found for slug: {0}")]
    ProductNotFound(String),
    #[error("Could not determine a snapshot directory; pass --snapshot-dir or set CATALOG_SNAPSHOT_DIR")]
    NoSnapshotDir,
    #[error(
        "The store is not configured. Set WOOCOMMERCE_URL, WOOCOMMERCE_CONSUMER_KEY and WOOCOMMERCE_CONSUMER_SECRET."
    )]
    StoreNotConfigured,
}
