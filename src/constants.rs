//! Application-wide constants and magic numbers
//!
//! This module centralizes the hardcoded defaults so `config.yaml` only
//! needs to mention what it overrides.

use std::time::Duration;

/// Market data (CoinGecko) constants
pub mod market_data {
    use super::*;

    /// Public CoinGecko API root
    pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

    /// Pricing currency for the markets endpoint
    pub const VS_CURRENCY: &str = "usd";

    /// CoinGecko caps `per_page` at 250
    pub const PER_PAGE: u32 = 250;

    /// Pages fetched per refresh (2 x 250 = the 500-coin universe)
    pub const PAGES: u32 = 2;

    /// HTTP timeout per request
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
}

/// Retry constants shared by every supplier
pub mod retry {
    /// Attempt ceiling per request
    pub const MAX_ATTEMPTS: u32 = 5;

    /// Backoff base; attempt n waits base * 2^n
    pub const BASE_DELAY_MS: u64 = 1_000;

    /// Upper bound of the random jitter added to each wait
    pub const MAX_JITTER_MS: u64 = 250;
}

/// Ranking constants
pub mod ranking {
    /// Records of the ranked universe considered for sorting
    pub const UNIVERSE_LIMIT: usize = 500;
}

/// Flat-file names
pub mod files {
    /// Cached market snapshot (JSON array of coin records)
    pub const MARKET_SNAPSHOT: &str = "marketcap.json";

    /// Infix used for lists derived from Hyperliquid listings
    pub const HYPERLIQUID_TAG: &str = "hype";
}

/// Venue endpoints and decorations
pub mod venues {
    pub const BINANCE_DISPLAY_PREFIX: &str = "BINANCE:";
    pub const BINANCE_PERPETUAL_SUFFIX: &str = "PERP";
    pub const BINANCE_SPOT_URL: &str = "https://api.binance.com/api/v3/exchangeInfo";
    pub const BINANCE_FUTURES_URL: &str = "https://fapi.binance.com/fapi/v1/exchangeInfo";

    pub const BYBIT_DISPLAY_PREFIX: &str = "BYBIT:";
    pub const BYBIT_PERPETUAL_SUFFIX: &str = "PERP";
    pub const BYBIT_INSTRUMENTS_URL: &str = "https://api.bybit.com/v5/market/instruments-info";
    /// Bybit caps `limit` on instruments-info at 1000
    pub const BYBIT_PAGE_LIMIT: u32 = 1000;
    /// `retCode` Bybit answers with when rate limited
    pub const BYBIT_RATE_LIMIT_CODE: i64 = 10006;
    pub const BYBIT_EXCLUDED_COINS: [&str; 2] = ["USDC", "USDE"];

    pub const HYPERLIQUID_INFO_URL: &str = "https://api.hyperliquid.xyz/info";
    pub const HYPERLIQUID_QUOTE: &str = "USDC";

    /// Coins never ranked against a quote (stablecoins and fiat on Binance)
    pub const BINANCE_EXCLUDED_COINS: [&str; 3] = ["USDC", "FDUSD", "EUR"];
}

/// Logging event names for structured logging
pub mod events {
    pub const SNAPSHOT_SAVED: &str = "snapshot_saved";
    pub const PAIRS_SAVED: &str = "pairs_saved";
    pub const PAIRS_FILE_MISSING: &str = "pairs_file_missing";
    pub const SUPPLIER_RETRY: &str = "supplier_retry";
    pub const SPECIAL_MATCH: &str = "special_match";
    pub const WATCHLIST_SORTED: &str = "watchlist_sorted";
}
