//! Symbol normalization helpers.
//!
//! Canonical coin code (used internally for matching):
//! - uppercase, no venue prefix, no contract suffix, no scale prefix
//!   e.g. "BINANCE:1000PEPEUSDTPERP" -> "PEPEUSDT", "kPEPE" -> "PEPE"
//!
//! Venue decorations (TradingView list format):
//! - Binance spot:      "BINANCE:BTCUSDT"
//! - Binance perpetual: "BINANCE:BTCUSDTPERP"

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::types::{MarketKind, Pair};

/// One scale-prefix rule. Rules run in order and the first one that fires
/// wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScaleRule {
    /// Digits prepended by venues to very low priced coins ("1000PEPE").
    /// Only fires when a letter follows, so "1INCH" style names survive.
    NumericPrefix { prefix: String },
    /// Hyperliquid style "kPEPE": lowercase k, then an uppercase letter.
    LowercaseK,
}

impl ScaleRule {
    pub fn numeric(prefix: &str) -> Self {
        ScaleRule::NumericPrefix {
            prefix: prefix.to_string(),
        }
    }

    fn strip<'a>(&self, coin: &'a str) -> Option<&'a str> {
        match self {
            ScaleRule::NumericPrefix { prefix } => {
                let rest = coin.strip_prefix(prefix.as_str())?;
                rest.starts_with(|c: char| c.is_ascii_alphabetic())
                    .then_some(rest)
            }
            ScaleRule::LowercaseK => {
                let rest = coin.strip_prefix('k')?;
                rest.starts_with(|c: char| c.is_ascii_uppercase())
                    .then_some(rest)
            }
        }
    }
}

/// Longest numeric prefix first so "1000000MOG" is not read as "1000" + "000MOG".
pub fn default_scale_rules() -> Vec<ScaleRule> {
    vec![
        ScaleRule::numeric("1000000"),
        ScaleRule::numeric("1000"),
        ScaleRule::LowercaseK,
    ]
}

/// Venue prefix and contract suffix used in persisted pair lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoration {
    pub prefix: String,
    pub perpetual_suffix: String,
}

impl Decoration {
    pub fn new(prefix: &str, perpetual_suffix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            perpetual_suffix: perpetual_suffix.to_string(),
        }
    }

    /// Removes the prefix and the suffix, each independently of the other.
    /// Case-insensitive; never strips a token that makes up the whole string.
    pub fn strip<'a>(&self, raw: &'a str) -> &'a str {
        let mut s = raw.trim();
        if let Some(rest) = strip_prefix_ci(s, &self.prefix) {
            if !rest.is_empty() {
                s = rest;
            }
        }
        if let Some(rest) = strip_suffix_ci(s, &self.perpetual_suffix) {
            if !rest.is_empty() {
                s = rest;
            }
        }
        s
    }

    /// Formats a pair the way the venue's list files spell it.
    pub fn decorate(&self, pair: &Pair) -> String {
        if let Some(listing) = &pair.listing {
            return listing.clone();
        }
        let suffix = match pair.kind {
            MarketKind::Perpetual => self.perpetual_suffix.as_str(),
            MarketKind::Spot => "",
        };
        format!("{}{}{}", self.prefix, pair.composite(), suffix)
    }

    /// Parses a decorated line back into a pair quoted in `quote`.
    ///
    /// A line that does not end in `quote` becomes a pair whose coin is the
    /// whole stripped symbol and whose quote is empty. The raw line is kept
    /// byte for byte either way, so `decorate` writes it back unchanged.
    pub fn parse_line(&self, line: &str, quote: &str, kind: MarketKind) -> Pair {
        let symbol = self.strip(line).to_ascii_uppercase();
        let quote = quote.to_ascii_uppercase();

        let (coin, quote) = match symbol.strip_suffix(quote.as_str()) {
            Some(coin) if !coin.is_empty() && !quote.is_empty() => (coin.to_string(), quote),
            _ => (symbol.clone(), String::new()),
        };

        Pair {
            coin,
            quote,
            kind,
            listing: Some(line.to_string()),
        }
    }
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() || s.len() < prefix.len() || !s.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, rest) = s.split_at(prefix.len());
    head.eq_ignore_ascii_case(prefix).then_some(rest)
}

fn strip_suffix_ci<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    if suffix.is_empty() || s.len() < suffix.len() {
        return None;
    }
    let at = s.len() - suffix.len();
    if !s.is_char_boundary(at) {
        return None;
    }
    let (rest, tail) = s.split_at(at);
    tail.eq_ignore_ascii_case(suffix).then_some(rest)
}

/// Canonical coin code. Equality and hashing look at `code` only, so a
/// scaled and an unscaled ticker of the same coin compare equal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NormalizedCoin {
    pub code: String,
    /// A scale prefix was stripped. Diagnostics only.
    pub scaled: bool,
}

impl PartialEq for NormalizedCoin {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for NormalizedCoin {}

impl Hash for NormalizedCoin {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl fmt::Display for NormalizedCoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

#[derive(Clone, Debug)]
pub struct Normalizer {
    decoration: Decoration,
    rules: Vec<ScaleRule>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Decoration::default(), default_scale_rules())
    }
}

impl Normalizer {
    pub fn new(decoration: Decoration, rules: Vec<ScaleRule>) -> Self {
        Self { decoration, rules }
    }

    /// Never fails. Runs the strip/scale/fold pass until nothing changes,
    /// which makes the result a fixed point: normalize(normalize(x)) == normalize(x).
    pub fn normalize(&self, raw: &str) -> NormalizedCoin {
        self.fixed_point(raw, true)
    }

    /// Same as `normalize` for a bare coin code: scale rules and case folding
    /// only, so a coin named like the contract suffix ("PERP") stays intact.
    pub fn normalize_coin(&self, coin: &str) -> NormalizedCoin {
        self.fixed_point(coin, false)
    }

    fn fixed_point(&self, raw: &str, decorated: bool) -> NormalizedCoin {
        let mut scaled = false;
        let mut current = raw.trim().to_string();

        loop {
            let (next, fired) = self.single_pass(&current, decorated);
            scaled |= fired;
            if next == current {
                break;
            }
            current = next;
        }

        NormalizedCoin {
            code: current,
            scaled,
        }
    }

    fn single_pass(&self, raw: &str, decorated: bool) -> (String, bool) {
        let bare = if decorated { self.decoration.strip(raw) } else { raw };
        let unscaled = self.rules.iter().find_map(|rule| rule.strip(bare));
        match unscaled {
            Some(rest) => (rest.to_ascii_uppercase(), true),
            None => (bare.to_ascii_uppercase(), false),
        }
    }
}
