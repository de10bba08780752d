//! In-memory catalog that answers listing queries the way WooCommerce does.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

use crate::client::{CatalogSource, OrderBy, ProductQuery, SortOrder};
use crate::models::{sample_entry, CatalogEntry, ProductId};
use crate::{Error, Result};

#[derive(Default)]
pub struct FakeCatalog {
    products: Mutex<Vec<CatalogEntry>>,
    calls: Mutex<Vec<ProductQuery>>,
    /// Calls numbered from this one onward fail with the given status
    fail_from: Mutex<Option<(usize, u16)>>,
    unconfigured: bool,
}

impl FakeCatalog {
    /// Products `1..=count`, product `n` created `n` minutes after `base`.
    pub fn with_products(count: u64, base: DateTime<Utc>) -> Self {
        let catalog = Self::default();
        for id in 1..=count {
            catalog.add_product(id, base + Duration::minutes(i64::try_from(id).unwrap()));
        }
        catalog
    }

    pub fn unconfigured() -> Self {
        Self {
            unconfigured: true,
            ..Self::default()
        }
    }

    pub fn add_product(&self, id: ProductId, created: DateTime<Utc>) {
        lock(&self.products).push(sample_entry(id, created));
    }

    pub fn update_product(
        &self,
        id: ProductId,
        modified: DateTime<Utc>,
        edit: impl FnOnce(&mut CatalogEntry),
    ) {
        let mut products = lock(&self.products);
        let entry = products
            .iter_mut()
            .find(|entry| entry.id == id)
            .expect("product exists");
        entry.date_modified = modified;
        edit(entry);
    }

    pub fn touch(&self, id: ProductId, modified: DateTime<Utc>) {
        self.update_product(id, modified, |_| {});
    }

    pub fn remove_product(&self, id: ProductId) {
        lock(&self.products).retain(|entry| entry.id != id);
    }

    /// Make call number `call` (1-based) and every later call fail.
    pub fn fail_from_call(&self, call: usize, status: u16) {
        *lock(&self.fail_from) = Some((call, status));
    }

    pub fn fail_next_calls(&self, status: u16) {
        let next = self.call_count() + 1;
        self.fail_from_call(next, status);
    }

    pub fn recover(&self) {
        *lock(&self.fail_from) = None;
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls(&self) -> Vec<ProductQuery> {
        lock(&self.calls).clone()
    }

    fn respond(&self, query: &ProductQuery) -> Result<Vec<CatalogEntry>> {
        let call_number = {
            let mut calls = lock(&self.calls);
            calls.push(query.clone());
            calls.len()
        };
        if let Some((from, status)) = *lock(&self.fail_from) {
            if call_number >= from {
                return Err(Error::Http {
                    status,
                    message: "simulated failure".to_string(),
                });
            }
        }

        let mut matching = lock(&self.products)
            .iter()
            .filter(|entry| query.slug.as_deref().map_or(true, |slug| entry.slug == slug))
            .filter(|entry| query.after.map_or(true, |after| entry.date_created > after))
            .filter(|entry| {
                query
                    .modified_after
                    .map_or(true, |after| entry.date_modified > after)
            })
            .filter(|entry| {
                query
                    .category
                    .map_or(true, |id| entry.categories.iter().any(|c| c.id == id))
            })
            .filter(|entry| query.on_sale.map_or(true, |flag| entry.on_sale == flag))
            .filter(|entry| query.featured.map_or(true, |flag| entry.featured == flag))
            .cloned()
            .collect::<Vec<_>>();

        matching.sort_by(|a, b| {
            let ordering = match query.order_by {
                OrderBy::Date => a.date_created.cmp(&b.date_created),
                OrderBy::Modified => a.date_modified.cmp(&b.date_modified),
                _ => std::cmp::Ordering::Equal,
            }
            .then_with(|| a.id.cmp(&b.id));
            match query.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let per_page = query.page_size() as usize;
        let skip = (query.page.max(1) as usize - 1) * per_page;
        Ok(matching.into_iter().skip(skip).take(per_page).collect())
    }
}

impl CatalogSource for FakeCatalog {
    async fn fetch_page(&self, query: &ProductQuery) -> Result<Vec<CatalogEntry>> {
        // Suspend once like a real request so concurrent callers interleave.
        tokio::task::yield_now().await;
        self.respond(query)
    }

    fn is_configured(&self) -> bool {
        !self.unconfigured
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
