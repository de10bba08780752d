//! Full-snapshot and incremental delta fetchers.

use chrono::{DateTime, Utc};

use crate::client::{CatalogSource, OrderBy, ProductQuery, SortOrder};
use crate::models::CatalogEntry;
use crate::{Error, Result};

/// Upper bound on pages walked for a single listing.
pub const MAX_PAGES: u32 = 1_000;

/// Products created and modified since a watermark.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    pub new_entries: Vec<CatalogEntry>,
    pub updated_entries: Vec<CatalogEntry>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.new_entries.is_empty() && self.updated_entries.is_empty()
    }
}

/// Walk pages from 1 until a short page, returning everything in page order.
///
/// All-or-nothing: if any page fails, pages fetched so far are discarded and
/// the error is returned.
pub async fn fetch_all_pages<S: CatalogSource>(
    source: &S,
    base: &ProductQuery,
) -> Result<Vec<CatalogEntry>> {
    let page_size = usize::try_from(base.page_size()).unwrap_or(usize::MAX);
    let mut entries = Vec::new();

    for page in 1..=MAX_PAGES {
        let batch = source.fetch_page(&base.with_page(page)).await?;
        let received = batch.len();
        entries.extend(batch);

        if received < page_size {
            return Ok(entries);
        }
    }

    Err(Error::PaginationLimit {
        max_pages: MAX_PAGES,
    })
}

/// Fetch the entire catalog, newest first. Used for cold starts.
pub async fn fetch_full_snapshot<S: CatalogSource>(
    source: &S,
    page_size: u32,
) -> Result<Vec<CatalogEntry>> {
    let query = ProductQuery {
        order_by: OrderBy::Date,
        order: SortOrder::Desc,
        ..ProductQuery::page_of(page_size)
    };
    let entries = fetch_all_pages(source, &query).await?;
    tracing::info!(fetched = entries.len(), "Fetched full catalog snapshot");
    Ok(entries)
}

/// Fetch products created after `after` and products modified after `after`.
///
/// The two listings are independent and run concurrently; either failing
/// fails the whole delta.
pub async fn fetch_deltas<S: CatalogSource>(
    source: &S,
    after: DateTime<Utc>,
    page_size: u32,
) -> Result<Delta> {
    let created_query = ProductQuery {
        after: Some(after),
        order_by: OrderBy::Date,
        order: SortOrder::Asc,
        ..ProductQuery::page_of(page_size)
    };
    let modified_query = ProductQuery {
        modified_after: Some(after),
        order_by: OrderBy::Modified,
        order: SortOrder::Asc,
        ..ProductQuery::page_of(page_size)
    };

    let (new_entries, updated_entries) = tokio::try_join!(
        fetch_all_pages(source, &created_query),
        fetch_all_pages(source, &modified_query),
    )?;

    tracing::info!(
        watermark = %after,
        new = new_entries.len(),
        updated = updated_entries.len(),
        "Fetched catalog delta"
    );
    Ok(Delta {
        new_entries,
        updated_entries,
    })
}

/// Live lookup of a single product by slug; first match wins.
pub async fn fetch_by_slug<S: CatalogSource>(
    source: &S,
    slug: &str,
) -> Result<Option<CatalogEntry>> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Ok(None);
    }

    let query = ProductQuery {
        slug: Some(slug.to_string()),
        ..ProductQuery::page_of(1)
    };
    Ok(source.fetch_page(&query).await?.into_iter().next())
}
