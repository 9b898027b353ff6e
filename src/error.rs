//! Custom error types for the watchlist pipeline
//!
//! Provides structured, typed errors instead of generic Box<dyn Error>

use std::path::PathBuf;

use thiserror::Error;

use crate::constants::venues;

/// Top-level pipeline errors
#[derive(Error, Debug)]
pub enum WatchlistError {
    #[error("Supplier unavailable: {0}")]
    SupplierUnavailable(#[from] SupplierError),

    #[error("Market snapshot not found at {path} (run with --fetch first)")]
    MissingSnapshot { path: PathBuf },

    #[error("IO error on {path}: {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Snapshot decode error in {path}: {error}")]
    Snapshot {
        path: PathBuf,
        #[source]
        error: serde_json::Error,
    },

    #[error("Invalid base selection: {0}")]
    InvalidBase(String),

    #[error("Unknown venue: {0}")]
    InvalidVenue(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
}

impl WatchlistError {
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        WatchlistError::Io {
            path: path.into(),
            error,
        }
    }
}

/// Errors raised while talking to a market data or pair supplier
#[derive(Error, Debug)]
pub enum SupplierError {
    #[error("{supplier} HTTP {status}: {body}")]
    Http {
        supplier: String,
        status: u16,
        body: String,
    },

    #[error("{supplier} gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        supplier: String,
        attempts: u32,
        last_error: String,
    },

    #[error("{venue} does not list {market} markets")]
    Unsupported { venue: String, market: String },

    #[error("{supplier} API error {code}: {message}")]
    Api {
        supplier: String,
        code: i64,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl SupplierError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SupplierError::Http { status, .. } => *status == 429 || *status >= 500,
            SupplierError::Api { code, .. } => *code == venues::BYBIT_RATE_LIMIT_CODE,
            SupplierError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

/// Conversion helpers for string errors
impl From<String> for WatchlistError {
    fn from(err: String) -> Self {
        WatchlistError::Config(err)
    }
}

impl From<&str> for WatchlistError {
    fn from(err: &str) -> Self {
        WatchlistError::Config(err.to_string())
    }
}
