use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::files;
use crate::error::WatchlistError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Binance,
    Bybit,
    Hyperliquid,
}

impl Venue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Venue::Binance => "binance",
            Venue::Bybit => "bybit",
            Venue::Hyperliquid => "hyperliquid",
        }
    }

    /// Infix naming lists derived from this venue's listings (`usdt_swap_hype_pairs.txt`).
    pub fn list_tag(&self) -> &'static str {
        match self {
            Venue::Hyperliquid => files::HYPERLIQUID_TAG,
            other => other.as_str(),
        }
    }
}

impl FromStr for Venue {
    type Err = WatchlistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "binance" => Ok(Venue::Binance),
            "bybit" => Ok(Venue::Bybit),
            "hyperliquid" | "hype" => Ok(Venue::Hyperliquid),
            _ => Err(WatchlistError::InvalidVenue(s.to_string())),
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    Spot,
    Perpetual,
}

impl MarketKind {
    /// Tag used in pair-list file names.
    pub fn file_tag(&self) -> &'static str {
        match self {
            MarketKind::Spot => "spot",
            MarketKind::Perpetual => "swap",
        }
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketKind::Spot => f.write_str("spot"),
            MarketKind::Perpetual => f.write_str("perpetual"),
        }
    }
}

/// Quote currency plus market kind, parsed from a base token like
/// `usdtperp` (USDT perpetuals) or `fdusd` (FDUSD spot).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSelection {
    pub quote: String,
    pub kind: MarketKind,
}

impl MarketSelection {
    pub fn new(quote: &str, kind: MarketKind) -> Self {
        Self {
            quote: quote.to_uppercase(),
            kind,
        }
    }
}

impl FromStr for MarketSelection {
    type Err = WatchlistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let lower = token.to_lowercase();
        let (quote, kind) = match lower.strip_suffix("perp") {
            Some(rest) => (rest, MarketKind::Perpetual),
            None => (lower.as_str(), MarketKind::Spot),
        };

        if quote.is_empty() || !quote.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(WatchlistError::InvalidBase(token.to_string()));
        }
        Ok(MarketSelection::new(quote, kind))
    }
}

impl fmt::Display for MarketSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.quote, self.kind)
    }
}

/// A trading pair decomposed into coin, quote and market kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub coin: String,
    pub quote: String,
    pub kind: MarketKind,
    /// Raw decorated line the pair was read from, if any. Lines that did not
    /// parse are written back exactly as read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing: Option<String>,
}

impl Pair {
    pub fn new(coin: &str, quote: &str, kind: MarketKind) -> Self {
        Self {
            coin: coin.to_string(),
            quote: quote.to_string(),
            kind,
            listing: None,
        }
    }

    /// Composite symbol: coin followed by quote, e.g. `BTCUSDT`.
    pub fn composite(&self) -> String {
        format!("{}{}", self.coin, self.quote)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.coin, self.quote)
    }
}
