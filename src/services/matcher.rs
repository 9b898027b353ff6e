use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::constants::events;
use crate::exchange::symbols::Normalizer;
use crate::exchange::types::Pair;

/// A source pair and the target pair listing the same coin.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PairMatch {
    pub source: Pair,
    pub target: Pair,
    /// Either side carried a scale prefix (kPEPE -> 1000PEPE).
    pub scaled: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MatchResult {
    pub matched: Vec<PairMatch>,
    pub unmatched_source: Vec<Pair>,
    /// Source pairs dropped as self-referential (stablecoin against itself).
    pub excluded: usize,
}

impl MatchResult {
    pub fn targets(&self) -> Vec<Pair> {
        self.matched.iter().map(|m| m.target.clone()).collect()
    }

    pub fn sources(&self) -> Vec<Pair> {
        self.matched.iter().map(|m| m.source.clone()).collect()
    }

    pub fn special_matches(&self) -> usize {
        self.matched.iter().filter(|m| m.scaled).count()
    }
}

/// True when `coin + quote` is an excluded coin quoted in `quote`, or the
/// quote against itself.
pub fn is_self_referential(coin: &str, quote: &str, excluded_coins: &[String]) -> bool {
    let composite = format!("{}{}", coin, quote);
    if !quote.is_empty() && coin.eq_ignore_ascii_case(quote) {
        return true;
    }
    excluded_coins
        .iter()
        .any(|ex| composite.eq_ignore_ascii_case(&format!("{}{}", ex, quote)))
}

/// Matches `source` pairs against `target` pairs by normalized coin code.
///
/// Matched entries follow source order. When several targets normalize to
/// the same code the last one listed is used. Inputs are not modified.
pub fn match_pairs(
    source: &[Pair],
    target: &[Pair],
    excluded_coins: &[String],
    normalizer: &Normalizer,
) -> MatchResult {
    let mut index: HashMap<String, (&Pair, bool)> = HashMap::with_capacity(target.len());
    for pair in target {
        let coin = normalizer.normalize_coin(&pair.coin);
        index.insert(coin.code, (pair, coin.scaled));
    }

    let mut result = MatchResult::default();
    for pair in source {
        let coin = normalizer.normalize_coin(&pair.coin);
        if is_self_referential(&coin.code, &pair.quote, excluded_coins) {
            debug!("[MATCH] Skipping self-referential {}", pair);
            result.excluded += 1;
            continue;
        }

        match index.get(&coin.code) {
            Some((target, target_scaled)) => {
                let scaled = coin.scaled || *target_scaled;
                if scaled {
                    info!(
                        event = events::SPECIAL_MATCH,
                        "[MATCH] Special match: {} -> {}",
                        pair.coin,
                        target.coin
                    );
                }
                result.matched.push(PairMatch {
                    source: pair.clone(),
                    target: (*target).clone(),
                    scaled,
                });
            }
            None => result.unmatched_source.push(pair.clone()),
        }
    }

    if !result.unmatched_source.is_empty() {
        let missing: Vec<String> = result.unmatched_source.iter().map(|p| p.to_string()).collect();
        info!("[MATCH] Not found in target list: {}", missing.join(", "));
    }
    info!(
        "[MATCH] {} matched ({} normal, {} special prefix), {} unmatched, {} excluded",
        result.matched.len(),
        result.matched.len() - result.special_matches(),
        result.special_matches(),
        result.unmatched_source.len(),
        result.excluded
    );

    result
}
