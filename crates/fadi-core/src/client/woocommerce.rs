//! WooCommerce REST API client.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use super::{parse_products, CatalogSource, ProductQuery};
use crate::models::CatalogEntry;
use crate::util::{compact_text, is_http_url, normalize_text_option};
use crate::{Error, Result};

const PRODUCTS_PATH: &str = "wp-json/wc/v3/products";

/// WooCommerce REST consumer key/secret pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .finish()
    }
}

/// How credentials travel with each request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    /// HTTP Basic auth header (`key:secret`)
    #[default]
    Basic,
    /// `consumer_key` / `consumer_secret` query parameters
    QueryString,
}

impl AuthMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "basic" => Some(Self::Basic),
            "query" | "querystring" => Some(Self::QueryString),
            _ => None,
        }
    }
}

#[derive(Clone)]
struct Remote {
    endpoint: Url,
    credentials: Credentials,
    auth_mode: AuthMode,
}

/// Authenticated, read-only client for the WooCommerce products endpoint.
///
/// A client built without credentials reports itself as unconfigured and
/// never touches the network.
#[derive(Clone)]
pub struct WooCommerceClient {
    remote: Option<Remote>,
    client: reqwest::Client,
}

impl fmt::Debug for WooCommerceClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("WooCommerceClient")
            .field(
                "endpoint",
                &self.remote.as_ref().map(|remote| remote.endpoint.as_str()),
            )
            .field(
                "auth_mode",
                &self.remote.as_ref().map(|remote| remote.auth_mode),
            )
            .finish_non_exhaustive()
    }
}

impl WooCommerceClient {
    /// Build a client for the store at `store_url`.
    pub fn new(
        store_url: &str,
        credentials: Credentials,
        auth_mode: AuthMode,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = products_endpoint(store_url)?;
        if credentials.consumer_key.trim().is_empty()
            || credentials.consumer_secret.trim().is_empty()
        {
            return Err(Error::Config(
                "WooCommerce consumer key and secret must not be empty".to_string(),
            ));
        }

        Ok(Self {
            remote: Some(Remote {
                endpoint,
                credentials,
                auth_mode,
            }),
            client: build_http_client(timeout)?,
        })
    }

    /// A client with no remote; every catalog read degrades to empty.
    pub fn unconfigured() -> Result<Self> {
        Ok(Self {
            remote: None,
            client: build_http_client(Duration::from_secs(1))?,
        })
    }

    /// Products endpoint URL, when configured.
    pub fn endpoint(&self) -> Option<&str> {
        self.remote.as_ref().map(|remote| remote.endpoint.as_str())
    }

    async fn request_page(&self, query: &ProductQuery) -> Result<Vec<CatalogEntry>> {
        let remote = self.remote.as_ref().ok_or_else(|| {
            Error::Config("WooCommerce credentials are not configured".to_string())
        })?;

        let mut request = self
            .client
            .get(remote.endpoint.clone())
            .query(&query.to_params())
            .header(reqwest::header::ACCEPT, "application/json");

        request = match remote.auth_mode {
            AuthMode::Basic => request.basic_auth(
                &remote.credentials.consumer_key,
                Some(&remote.credentials.consumer_secret),
            ),
            AuthMode::QueryString => request.query(&[
                ("consumer_key", remote.credentials.consumer_key.as_str()),
                ("consumer_secret", remote.credentials.consumer_secret.as_str()),
            ]),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                message: parse_api_error(status, &body),
            });
        }

        let body = response.text().await?;
        let products = parse_products(&body)?;
        tracing::debug!(
            page = query.page,
            per_page = query.page_size(),
            received = products.len(),
            "Fetched catalog page"
        );
        Ok(products)
    }
}

impl CatalogSource for WooCommerceClient {
    async fn fetch_page(&self, query: &ProductQuery) -> Result<Vec<CatalogEntry>> {
        self.request_page(query).await
    }

    fn is_configured(&self) -> bool {
        self.remote.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct WooErrorBody {
    code: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<WooErrorBody>(body) {
        match (payload.message, payload.code) {
            (Some(message), Some(code)) => {
                return format!("{} [{}] ({})", compact_text(&message), code, status.as_u16());
            }
            (Some(message), None) | (None, Some(message)) => {
                return format!("{} ({})", compact_text(&message), status.as_u16());
            }
            (None, None) => {}
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn products_endpoint(store_url: &str) -> Result<Url> {
    let base = normalize_text_option(Some(store_url.to_string()))
        .ok_or_else(|| Error::Config("store URL must not be empty".to_string()))?;
    if !is_http_url(&base) {
        return Err(Error::Config(
            "store URL must include http:// or https://".to_string(),
        ));
    }

    let endpoint = format!("{}/{PRODUCTS_PATH}", base.trim_end_matches('/'));
    Url::parse(&endpoint).map_err(|error| Error::Config(format!("invalid store URL: {error}")))
}

fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("fadi-core/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|error| Error::Config(format!("failed to build HTTP client: {error}")))
}
