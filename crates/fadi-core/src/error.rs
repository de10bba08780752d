//! Error types for fadi-core

use thiserror::Error;

/// Result type alias using fadi-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fadi-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid catalog configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote catalog answered with a non-2xx status
    #[error("Catalog API returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Remote catalog did not answer within the request timeout
    #[error("Catalog request timed out: {0}")]
    Timeout(String),

    /// Network-level failure talking to the remote catalog
    #[error("Catalog transport error: {0}")]
    Transport(String),

    /// Remote payload did not match the expected product schema
    #[error("Invalid catalog payload: {0}")]
    InvalidPayload(String),

    /// Pagination did not terminate within the page guard
    #[error("Pagination exceeded {max_pages} pages")]
    PaginationLimit { max_pages: u32 },

    /// A concurrent refresh this call waited on failed
    #[error("Catalog refresh failed: {0}")]
    RefreshFailed(String),

    /// Product not found
    #[error("Product not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether a retry of the same request could plausibly succeed.
    ///
    /// Timeouts, transport failures, throttling (429) and server-side (5xx)
    /// statuses are transient; everything else is a caller or schema problem.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout(error.to_string());
        }
        if error.is_decode() {
            return Self::InvalidPayload(error.to_string());
        }
        if let Some(status) = error.status() {
            return Self::Http {
                status: status.as_u16(),
                message: error.to_string(),
            };
        }
        Self::Transport(error.to_string())
    }
}
