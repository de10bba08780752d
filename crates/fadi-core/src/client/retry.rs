//! Bounded retry with exponential backoff around any [`CatalogSource`].

use std::time::Duration;

use super::{CatalogSource, ProductQuery};
use crate::models::CatalogEntry;
use crate::Result;

/// Retry budget for a single page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; 1 disables retries
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent retry
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (1-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Wraps a source so transient failures are retried per [`RetryPolicy`].
///
/// Non-transient errors (4xx other than 429, schema errors, configuration
/// errors) are returned immediately.
#[derive(Debug, Clone)]
pub struct RetryingSource<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingSource<S> {
    pub const fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub const fn inner(&self) -> &S {
        &self.inner
    }

    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

impl<S: CatalogSource> CatalogSource for RetryingSource<S> {
    async fn fetch_page(&self, query: &ProductQuery) -> Result<Vec<CatalogEntry>> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.inner.fetch_page(query).await {
                Ok(entries) => return Ok(entries),
                Err(error) if error.is_transient() && attempt < max_attempts => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        page = query.page,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Transient catalog error, retrying: {error}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    fn is_configured(&self) -> bool {
        self.inner.is_configured()
    }
}
