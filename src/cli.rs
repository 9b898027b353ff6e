//! Command-line interface

use std::path::PathBuf;

use clap::Parser;

use crate::error::WatchlistError;
use crate::exchange::types::{MarketSelection, Venue};
use crate::services::pipeline::RunOptions;

/// Ranked TradingView watchlists from market cap data and exchange listings
#[derive(Parser, Debug)]
#[command(name = "rust_watchlist")]
#[command(version)]
pub struct Cli {
    /// Quote currency, with a `perp` suffix for perpetuals (usdtperp, fdusd, usdcperp)
    #[arg(long, default_value = "usdtperp")]
    pub base: String,

    /// Fetch fresh market data before sorting
    #[arg(long)]
    pub fetch: bool,

    /// Refresh the exchange pair list before sorting
    #[arg(long)]
    pub get_pairs: bool,

    /// Build the list of pairs also listed on Hyperliquid (same as --match-from hyperliquid)
    #[arg(long, conflicts_with = "match_from")]
    pub hyperliquid: bool,

    /// Build the list of pairs also listed on this venue (binance, bybit, hyperliquid)
    #[arg(long, value_name = "VENUE")]
    pub match_from: Option<Venue>,

    /// Venue whose pairs the matched list holds (defaults to the primary venue)
    #[arg(long, value_name = "VENUE")]
    pub match_onto: Option<Venue>,

    /// Refresh and sort another venue's own pair list
    #[arg(long, value_name = "VENUE")]
    pub exchange: Option<Venue>,

    /// Keep every --exchange pair instead of only those the primary venue lists
    #[arg(long, requires = "exchange")]
    pub unfiltered: bool,

    /// Path to config.yaml
    #[arg(long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Directory holding the flat files (overrides data_dir from the config)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl Cli {
    pub fn run_options(&self) -> Result<RunOptions, WatchlistError> {
        let match_from = if self.hyperliquid {
            Some(Venue::Hyperliquid)
        } else {
            self.match_from
        };
        if self.match_onto.is_some() && match_from.is_none() {
            return Err("--match-onto needs --match-from or --hyperliquid".into());
        }

        Ok(RunOptions {
            fetch: self.fetch,
            refresh_pairs: self.get_pairs,
            match_from,
            match_onto: self.match_onto,
            exchange: self.exchange,
            filter_against_primary: !self.unfiltered,
            ..RunOptions::new(self.base.parse::<MarketSelection>()?)
        })
    }
}
