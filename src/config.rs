use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::{files, market_data, ranking, retry, venues};
use crate::error::WatchlistError;
use crate::exchange::symbols::{default_scale_rules, Decoration, Normalizer, ScaleRule};
use crate::exchange::types::Venue;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MarketDataConfig {
    pub base_url: String,
    pub vs_currency: String,
    pub per_page: u32,
    pub pages: u32,
    pub timeout_secs: u64,
    pub snapshot_file: String,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            base_url: market_data::COINGECKO_BASE_URL.to_string(),
            vs_currency: market_data::VS_CURRENCY.to_string(),
            per_page: market_data::PER_PAGE,
            pages: market_data::PAGES,
            timeout_secs: market_data::REQUEST_TIMEOUT.as_secs(),
            snapshot_file: files::MARKET_SNAPSHOT.to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry::MAX_ATTEMPTS,
            base_delay_ms: retry::BASE_DELAY_MS,
            max_jitter_ms: retry::MAX_JITTER_MS,
        }
    }
}

/// Per-venue quirks: list decoration, excluded coins, native quote and
/// listing endpoints.
#[derive(Clone, Debug, Deserialize)]
pub struct VenueProfile {
    pub venue: Venue,
    #[serde(default)]
    pub display_prefix: String,
    #[serde(default)]
    pub perpetual_suffix: String,
    /// Quote the venue lists everything in, if it only has one (Hyperliquid: USDC).
    #[serde(default)]
    pub native_quote: Option<String>,
    /// Coins never ranked or matched against a quote, e.g. stablecoins.
    #[serde(default)]
    pub excluded_coins: Vec<String>,
    #[serde(default)]
    pub spot_url: Option<String>,
    #[serde(default)]
    pub perpetual_url: Option<String>,
}

impl VenueProfile {
    pub fn binance() -> Self {
        Self {
            venue: Venue::Binance,
            display_prefix: venues::BINANCE_DISPLAY_PREFIX.to_string(),
            perpetual_suffix: venues::BINANCE_PERPETUAL_SUFFIX.to_string(),
            native_quote: None,
            excluded_coins: venues::BINANCE_EXCLUDED_COINS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            spot_url: Some(venues::BINANCE_SPOT_URL.to_string()),
            perpetual_url: Some(venues::BINANCE_FUTURES_URL.to_string()),
        }
    }

    pub fn bybit() -> Self {
        Self {
            venue: Venue::Bybit,
            display_prefix: venues::BYBIT_DISPLAY_PREFIX.to_string(),
            perpetual_suffix: venues::BYBIT_PERPETUAL_SUFFIX.to_string(),
            native_quote: None,
            excluded_coins: venues::BYBIT_EXCLUDED_COINS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            spot_url: Some(venues::BYBIT_INSTRUMENTS_URL.to_string()),
            perpetual_url: Some(venues::BYBIT_INSTRUMENTS_URL.to_string()),
        }
    }

    pub fn hyperliquid() -> Self {
        Self {
            venue: Venue::Hyperliquid,
            display_prefix: String::new(),
            perpetual_suffix: String::new(),
            native_quote: Some(venues::HYPERLIQUID_QUOTE.to_string()),
            excluded_coins: Vec::new(),
            spot_url: Some(venues::HYPERLIQUID_INFO_URL.to_string()),
            perpetual_url: Some(venues::HYPERLIQUID_INFO_URL.to_string()),
        }
    }

    pub fn decoration(&self) -> Decoration {
        Decoration::new(&self.display_prefix, &self.perpetual_suffix)
    }
}

fn default_venues() -> Vec<VenueProfile> {
    vec![
        VenueProfile::binance(),
        VenueProfile::bybit(),
        VenueProfile::hyperliquid(),
    ]
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Ranked records considered, counted from the top of the snapshot.
    pub universe_limit: usize,
    /// Venue whose pair lists are ranked and written.
    pub primary_venue: Venue,
    pub market_data: MarketDataConfig,
    pub retry: RetryConfig,
    pub normalization: Vec<ScaleRule>,
    pub venues: Vec<VenueProfile>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            universe_limit: ranking::UNIVERSE_LIMIT,
            primary_venue: Venue::Binance,
            market_data: MarketDataConfig::default(),
            retry: RetryConfig::default(),
            normalization: default_scale_rules(),
            venues: default_venues(),
        }
    }
}

impl AppConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, WatchlistError> {
        match fs::read_to_string(path) {
            Ok(content) => {
                let config = Self::from_yaml(&content)?;
                info!("[CONFIG] Loaded {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("[CONFIG] {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(WatchlistError::io(path, e)),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, WatchlistError> {
        // Strip BOM if present
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let mut config: AppConfig = if content.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.fill_missing_venues();
        config.validate()?;
        Ok(config)
    }

    /// Venues absent from the file keep their built-in profile.
    fn fill_missing_venues(&mut self) {
        for profile in default_venues() {
            if !self.venues.iter().any(|v| v.venue == profile.venue) {
                self.venues.push(profile);
            }
        }
    }

    fn validate(&self) -> Result<(), WatchlistError> {
        if self.market_data.pages == 0 || self.market_data.per_page == 0 {
            return Err("market_data.pages and market_data.per_page must be positive".into());
        }
        if self.retry.max_attempts == 0 {
            return Err("retry.max_attempts must be at least 1".into());
        }
        for rule in &self.normalization {
            if let ScaleRule::NumericPrefix { prefix } = rule {
                if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_digit()) {
                    return Err(format!("numeric_prefix rule needs digits, got {:?}", prefix).into());
                }
            }
        }
        Ok(())
    }

    pub fn venue(&self, venue: Venue) -> Result<&VenueProfile, WatchlistError> {
        self.venues
            .iter()
            .find(|p| p.venue == venue)
            .ok_or_else(|| WatchlistError::Config(format!("no profile for venue {}", venue)))
    }

    // Helper to build the normalizer for a venue's list format
    pub fn normalizer_for(&self, venue: Venue) -> Result<Normalizer, WatchlistError> {
        let profile = self.venue(venue)?;
        Ok(Normalizer::new(
            profile.decoration(),
            self.normalization.clone(),
        ))
    }
}
