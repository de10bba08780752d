//! Catalog entry model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::{is_http_url, strip_html};

/// Meta keys that may carry an affiliate link, in lookup order.
const AFFILIATE_META_KEYS: [&str; 3] = ["affiliate_url", "_affiliate_url", "affiliate_link"];

/// Remote-assigned product identifier.
pub type ProductId = u64;

/// Inventory state of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
    OnBackorder,
}

impl StockStatus {
    /// Label used in CLI and API output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InStock => "in-stock",
            Self::OutOfStock => "out-of-stock",
            Self::OnBackorder => "on-backorder",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// WooCommerce product type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    #[default]
    Simple,
    Variable,
    Grouped,
    External,
    #[serde(other)]
    Other,
}

/// Product image; the first image of a product is its primary image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub id: u64,
    pub src: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub alt: String,
}

/// Category (or tag) reference attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategory {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

/// Free-form key/value pair from the product's meta data bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaEntry {
    pub key: String,
    pub value: serde_json::Value,
}

/// A product as mirrored from the remote catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Remote identifier, unique within a snapshot
    pub id: ProductId,
    pub name: String,
    /// Lookup key for product pages; expected but not guaranteed unique
    pub slug: String,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub kind: ProductKind,
    /// Full HTML description
    #[serde(default)]
    pub description: String,
    /// Short HTML description
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub regular_price: Option<String>,
    #[serde(default)]
    pub sale_price: Option<String>,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub featured: bool,
    pub stock_status: StockStatus,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub categories: Vec<ProductCategory>,
    #[serde(default)]
    pub tags: Vec<ProductCategory>,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
    #[serde(default)]
    pub meta_data: Vec<MetaEntry>,
    /// Target of external (affiliate) products
    #[serde(default)]
    pub external_url: Option<String>,
}

impl CatalogEntry {
    /// First image, used as the product thumbnail
    #[must_use]
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images.first()
    }

    /// Value stored under `key` in the meta data bag.
    ///
    /// When a key repeats, the first occurrence wins.
    #[must_use]
    pub fn meta_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.meta_data
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.value)
    }

    /// Outbound affiliate link, from meta data first, then `external_url`.
    #[must_use]
    pub fn affiliate_url(&self) -> Option<&str> {
        AFFILIATE_META_KEYS
            .iter()
            .filter_map(|key| self.meta_value(key))
            .filter_map(serde_json::Value::as_str)
            .map(str::trim)
            .find(|value| is_http_url(value))
            .or_else(|| {
                self.external_url
                    .as_deref()
                    .map(str::trim)
                    .filter(|value| is_http_url(value))
            })
    }

    /// Match a category by slug (case-insensitive) or numeric id.
    #[must_use]
    pub fn in_category(&self, selector: &str) -> bool {
        let selector = selector.trim();
        if selector.is_empty() {
            return false;
        }
        let by_id = selector.parse::<u64>().ok();
        self.categories.iter().any(|category| {
            by_id == Some(category.id) || category.slug.eq_ignore_ascii_case(selector)
        })
    }

    #[must_use]
    pub fn is_in_stock(&self) -> bool {
        self.stock_status == StockStatus::InStock
    }

    /// Percentage saved against the regular price, rounded to the nearest
    /// whole percent. `None` unless the product is on sale below its regular
    /// price.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn discount_percent(&self) -> Option<u8> {
        if !self.on_sale {
            return None;
        }
        let regular = parse_price(self.regular_price.as_deref())?;
        let sale = parse_price(self.sale_price.as_deref().or(self.price.as_deref()))?;
        if regular <= 0.0 || sale >= regular || sale < 0.0 {
            return None;
        }
        Some(((1.0 - sale / regular) * 100.0).round() as u8)
    }

    /// Short description with markup removed.
    #[must_use]
    pub fn plain_short_description(&self) -> String {
        strip_html(&self.short_description)
    }
}

fn parse_price(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
pub(crate) fn sample_entry(id: ProductId, created: DateTime<Utc>) -> CatalogEntry {
    CatalogEntry {
        id,
        name: format!("Product {id}"),
        slug: format!("product-{id}"),
        permalink: None,
        sku: None,
        kind: ProductKind::Simple,
        description: String::new(),
        short_description: String::new(),
        price: Some("10.00".to_string()),
        regular_price: Some("10.00".to_string()),
        sale_price: None,
        on_sale: false,
        featured: false,
        stock_status: StockStatus::InStock,
        stock_quantity: None,
        images: Vec::new(),
        categories: Vec::new(),
        tags: Vec::new(),
        date_created: created,
        date_modified: created,
        meta_data: Vec::new(),
        external_url: None,
    }
}
