//! Watchlist - ranked TradingView pair lists
//!
//! This library reconciles exchange pair listings across naming conventions
//! and orders them by the trading volume of a market cap snapshot.

pub mod cli;
pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod exchange;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use data::market::CoinRecord;
pub use error::{SupplierError, WatchlistError};
pub use exchange::symbols::{NormalizedCoin, Normalizer};
pub use exchange::types::{MarketKind, MarketSelection, Pair, Venue};
pub use services::matcher::{match_pairs, MatchResult};
pub use services::merger::{merge, MergeOutcome};
