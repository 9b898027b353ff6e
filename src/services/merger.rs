use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;
use tracing::{debug, info};

use crate::constants::events;
use crate::data::market::CoinRecord;
use crate::exchange::symbols::Normalizer;
use crate::services::matcher::is_self_referential;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MergeOutcome {
    /// Ranked matches first, then the never-matched lines in input order.
    pub lines: Vec<String>,
    pub ranked: usize,
    pub leftover: usize,
}

/// Orders `listed` lines by the volume ranking of `ranked`.
///
/// Lines are compared by normalized composite symbol, so `1000PEPEUSDT`
/// (or `BINANCE:1000PEPEUSDTPERP`) matches coin `pepe` quoted in USDT.
/// Each distinct line is emitted once; the first unconsumed line wins.
pub fn merge(
    ranked: &[CoinRecord],
    listed: &[String],
    base_quote: &str,
    excluded_coins: &[String],
    normalizer: &Normalizer,
) -> MergeOutcome {
    let base_quote = base_quote.trim().to_ascii_uppercase();

    // duplicates compare trimmed; the first occurrence is emitted byte for byte
    let mut seen = HashSet::new();
    let mut lines: Vec<&str> = Vec::with_capacity(listed.len());
    for line in listed {
        let key = line.trim();
        if !key.is_empty() && seen.insert(key) {
            lines.push(line.as_str());
        }
    }
    if lines.len() < listed.len() {
        debug!(
            "[SORT] Dropped {} blank or duplicate lines",
            listed.len() - lines.len()
        );
    }

    // composite code -> line positions, in file order
    let mut index: HashMap<String, VecDeque<usize>> = HashMap::with_capacity(lines.len());
    for (pos, line) in lines.iter().enumerate() {
        let code = normalizer.normalize(line).code;
        index.entry(code).or_default().push_back(pos);
    }

    let mut by_volume: Vec<&CoinRecord> = ranked.iter().collect();
    // stable: equal volumes keep snapshot (market cap) order
    by_volume.sort_by(|a, b| b.volume().total_cmp(&a.volume()));

    let mut consumed = vec![false; lines.len()];
    let mut out = Vec::with_capacity(lines.len());

    for record in by_volume {
        let coin = normalizer.normalize_coin(&record.symbol).code;
        if coin.is_empty() || is_self_referential(&coin, &base_quote, excluded_coins) {
            continue;
        }

        let expected = format!("{}{}", coin, base_quote);
        // each position sits in exactly one queue, so popping consumes it
        let hit = index.get_mut(&expected).and_then(VecDeque::pop_front);

        if let Some(pos) = hit {
            consumed[pos] = true;
            debug!(
                "[SORT] {} (rank {:?}, volume {}) -> {}",
                record.symbol,
                record.rank,
                record.volume(),
                lines[pos]
            );
            out.push(lines[pos].to_string());
        }
    }

    let ranked_count = out.len();
    out.extend(
        lines
            .iter()
            .zip(&consumed)
            .filter(|(_, used)| !**used)
            .map(|(line, _)| line.to_string()),
    );
    let leftover = out.len() - ranked_count;

    info!(
        event = events::WATCHLIST_SORTED,
        ranked = ranked_count,
        leftover,
        "[SORT] {} lines ranked, {} unsorted appended",
        ranked_count,
        leftover
    );

    MergeOutcome {
        lines: out,
        ranked: ranked_count,
        leftover,
    }
}
