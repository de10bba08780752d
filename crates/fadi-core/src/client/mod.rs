//! Remote catalog access.
//!
//! [`CatalogSource`] is the seam between the sync engine and the network:
//! the WooCommerce REST client implements it for production, and tests
//! substitute in-memory catalogs.

mod retry;
mod wire;
mod woocommerce;

use std::future::Future;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::CatalogEntry;
use crate::Result;

pub use retry::{RetryPolicy, RetryingSource};
pub use wire::parse_products;
pub use woocommerce::{AuthMode, Credentials, WooCommerceClient};

/// Largest page size the WooCommerce REST API accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Field a product listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderBy {
    #[default]
    Date,
    Modified,
    Id,
    Title,
    Price,
    Popularity,
}

impl OrderBy {
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Modified => "modified",
            Self::Id => "id",
            Self::Title => "title",
            Self::Price => "price",
            Self::Popularity => "popularity",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Filter and paging parameters for one product listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// 1-based page number
    pub page: u32,
    pub per_page: u32,
    /// Numeric category id
    pub category: Option<u64>,
    /// Only products created strictly after this instant
    pub after: Option<DateTime<Utc>>,
    /// Only products modified strictly after this instant
    pub modified_after: Option<DateTime<Utc>>,
    pub on_sale: Option<bool>,
    pub featured: Option<bool>,
    pub slug: Option<String>,
    pub order_by: OrderBy,
    pub order: SortOrder,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: MAX_PAGE_SIZE,
            category: None,
            after: None,
            modified_after: None,
            on_sale: None,
            featured: None,
            slug: None,
            order_by: OrderBy::default(),
            order: SortOrder::default(),
        }
    }
}

impl ProductQuery {
    /// Query for one page of the given size, with the size clamped to the
    /// remote limit.
    #[must_use]
    pub fn page_of(per_page: u32) -> Self {
        Self {
            per_page: per_page.clamp(1, MAX_PAGE_SIZE),
            ..Self::default()
        }
    }

    /// Same filters, different page.
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// Effective page size as sent to the remote.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.per_page.clamp(1, MAX_PAGE_SIZE)
    }

    /// WooCommerce query parameters for this request.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.max(1).to_string()),
            ("per_page", self.page_size().to_string()),
            ("orderby", self.order_by.as_param().to_string()),
            ("order", self.order.as_param().to_string()),
            ("status", "publish".to_string()),
        ];

        if let Some(category) = self.category {
            params.push(("category", category.to_string()));
        }
        if let Some(after) = self.after {
            params.push(("after", format_instant(after)));
        }
        if let Some(modified_after) = self.modified_after {
            params.push(("modified_after", format_instant(modified_after)));
        }
        if self.after.is_some() || self.modified_after.is_some() {
            params.push(("dates_are_gmt", "true".to_string()));
        }
        if let Some(on_sale) = self.on_sale {
            params.push(("on_sale", on_sale.to_string()));
        }
        if let Some(featured) = self.featured {
            params.push(("featured", featured.to_string()));
        }
        if let Some(slug) = self.slug.as_deref() {
            params.push(("slug", slug.to_string()));
        }

        params
    }
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A paginated, read-only product listing.
///
/// A page shorter than the requested page size (or empty) marks the end of
/// the stream.
pub trait CatalogSource: Send + Sync {
    /// Fetch one page of products matching `query`.
    fn fetch_page(
        &self,
        query: &ProductQuery,
    ) -> impl Future<Output = Result<Vec<CatalogEntry>>> + Send;

    /// Whether credentials are present. Unconfigured sources are never
    /// called; callers degrade to an empty catalog instead.
    fn is_configured(&self) -> bool {
        true
    }
}
