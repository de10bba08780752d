//! Catalog configuration read from the environment.
//!
//! Values are resolved through a lookup function so parsing can be exercised
//! without touching the process environment.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::client::{AuthMode, Credentials, RetryPolicy, RetryingSource, WooCommerceClient};
use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

const URL_VAR: &str = "WOOCOMMERCE_URL";
const KEY_VAR: &str = "WOOCOMMERCE_CONSUMER_KEY";
const SECRET_VAR: &str = "WOOCOMMERCE_CONSUMER_SECRET";

const DEFAULT_SNAPSHOT_MAX_AGE_HOURS: u64 = 24;

/// Age after which exported snapshot files count as stale.
pub const DEFAULT_SNAPSHOT_MAX_AGE: Duration =
    Duration::from_secs(DEFAULT_SNAPSHOT_MAX_AGE_HOURS * 3_600);

/// Store location and credentials. Present only when all three are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub store_url: String,
    pub credentials: Credentials,
    pub auth_mode: AuthMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub remote: Option<RemoteConfig>,
    pub page_size: u32,
    pub freshness_window: Duration,
    pub http_timeout: Duration,
    pub retry: RetryPolicy,
    /// Directory holding the exported snapshot documents
    pub snapshot_dir: Option<PathBuf>,
    pub snapshot_max_age: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            remote: None,
            page_size: 100,
            freshness_window: Duration::from_secs(86_400),
            http_timeout: Duration::from_secs(20),
            retry: RetryPolicy::default(),
            snapshot_dir: None,
            snapshot_max_age: DEFAULT_SNAPSHOT_MAX_AGE,
        }
    }
}

impl CatalogConfig {
    pub fn from_env() -> Result<Self> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let remote = parse_remote(&lookup)?;

        let page_size = bounded(&lookup, "CATALOG_PAGE_SIZE", 100, 1..=100)?;
        let freshness_secs = bounded(&lookup, "CATALOG_FRESHNESS_SECS", 86_400, 60..=604_800)?;
        let timeout_secs = bounded(&lookup, "CATALOG_HTTP_TIMEOUT_SECS", 20, 1..=120)?;
        let max_attempts = bounded(&lookup, "CATALOG_RETRY_MAX_ATTEMPTS", 1, 1..=10)?;
        let base_delay_ms = bounded(&lookup, "CATALOG_RETRY_BASE_DELAY_MS", 500, 0..=60_000)?;
        let max_age_hours = bounded(
            &lookup,
            "CATALOG_SNAPSHOT_MAX_AGE_HOURS",
            DEFAULT_SNAPSHOT_MAX_AGE_HOURS,
            1..=720,
        )?;

        let snapshot_dir = optional_trimmed(&lookup, "CATALOG_SNAPSHOT_DIR").map(PathBuf::from);

        Ok(Self {
            remote,
            page_size: u32::try_from(page_size).unwrap_or(100),
            freshness_window: Duration::from_secs(freshness_secs),
            http_timeout: Duration::from_secs(timeout_secs),
            retry: RetryPolicy {
                max_attempts: u32::try_from(max_attempts).unwrap_or(1),
                base_delay: Duration::from_millis(base_delay_ms),
                ..RetryPolicy::default()
            },
            snapshot_dir,
            snapshot_max_age: Duration::from_secs(max_age_hours * 3_600),
        })
    }

    pub const fn is_configured(&self) -> bool {
        self.remote.is_some()
    }

    /// Snapshot directory, falling back to `default` when none was configured.
    pub fn snapshot_dir_or(&self, default: impl Into<PathBuf>) -> PathBuf {
        self.snapshot_dir.clone().unwrap_or_else(|| default.into())
    }

    /// Build the WooCommerce client described by this config, wrapped in the
    /// configured retry policy. Without a remote the client is unconfigured.
    pub fn build_source(&self) -> Result<RetryingSource<WooCommerceClient>> {
        let client = match &self.remote {
            Some(remote) => WooCommerceClient::new(
                &remote.store_url,
                remote.credentials.clone(),
                remote.auth_mode,
                self.http_timeout,
            )?,
            None => WooCommerceClient::unconfigured()?,
        };
        Ok(RetryingSource::new(client, self.retry))
    }
}

fn parse_remote(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<RemoteConfig>> {
    let store_url = optional_trimmed(&lookup, URL_VAR);
    let consumer_key = optional_trimmed(&lookup, KEY_VAR);
    let consumer_secret = optional_trimmed(&lookup, SECRET_VAR);

    let (store_url, consumer_key, consumer_secret) = match (store_url, consumer_key, consumer_secret)
    {
        (None, None, None) => return Ok(None),
        (Some(url), Some(key), Some(secret)) => (url, key, secret),
        (url, key, secret) => {
            let missing = [
                (URL_VAR, url.is_none()),
                (KEY_VAR, key.is_none()),
                (SECRET_VAR, secret.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect::<Vec<_>>();
            return Err(Error::Config(format!(
                "incomplete WooCommerce configuration, missing {}",
                missing.join(", ")
            )));
        }
    };

    if !is_http_url(&store_url) {
        return Err(Error::Config(format!(
            "{URL_VAR} must start with http:// or https://"
        )));
    }

    let auth_mode = match optional_trimmed(&lookup, "WOOCOMMERCE_AUTH_MODE") {
        Some(raw) => AuthMode::parse(&raw).ok_or_else(|| {
            Error::Config(format!(
                "WOOCOMMERCE_AUTH_MODE must be 'basic' or 'query', got '{raw}'"
            ))
        })?,
        None => AuthMode::default(),
    };

    Ok(Some(RemoteConfig {
        store_url: store_url.trim_end_matches('/').to_string(),
        credentials: Credentials {
            consumer_key,
            consumer_secret,
        },
        auth_mode,
    }))
}

fn bounded(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
    range: std::ops::RangeInclusive<u64>,
) -> Result<u64> {
    let Some(raw) = optional_trimmed(lookup, name) else {
        return Ok(default);
    };
    let invalid = || {
        Error::Config(format!(
            "{name} must be an integer in [{}, {}]",
            range.start(),
            range.end()
        ))
    };
    let value = raw.parse::<u64>().map_err(|_| invalid())?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(invalid())
    }
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    normalize_text_option(lookup(name))
}
