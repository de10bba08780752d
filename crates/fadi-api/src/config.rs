use std::collections::HashMap;
use std::env;
use std::fmt;

use fadi_core::util::normalize_text_option;
use fadi_core::CatalogConfig;
use thiserror::Error;

const MIN_ADMIN_TOKEN_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Catalog(#[from] fadi_core::Error),
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Bearer token for the cache maintenance routes; `None` disables them
    pub admin_token: Option<String>,
    pub catalog: CatalogConfig,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field(
                "admin_token",
                &self.admin_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("catalog", &self.catalog)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = normalize_text_option(lookup("FADI_API_BIND_ADDR"))
            .unwrap_or_else(|| "127.0.0.1:8080".to_string());

        let admin_token = normalize_text_option(lookup("FADI_API_ADMIN_TOKEN"));
        if let Some(token) = admin_token.as_deref() {
            if token.len() < MIN_ADMIN_TOKEN_LEN {
                return Err(ConfigError::Invalid(format!(
                    "FADI_API_ADMIN_TOKEN must be at least {MIN_ADMIN_TOKEN_LEN} characters"
                )));
            }
        }

        let catalog = CatalogConfig::from_lookup(&lookup)?;

        Ok(Self {
            bind_addr,
            admin_token,
            catalog,
        })
    }
}
