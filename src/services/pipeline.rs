//! One parameterized watchlist run: refresh what was asked for, then rank
//! the pair lists against the market snapshot.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::data::market::{CoinGeckoClient, CoinRecord, MarketDataSupplier};
use crate::data::store::{FlatFileStore, ListKind};
use crate::error::WatchlistError;
use crate::exchange::factory::build_pair_supplier;
use crate::exchange::traits::PairSupplier;
use crate::exchange::types::{MarketSelection, Pair, Venue};
use crate::services::matcher::{match_pairs, MatchResult};
use crate::services::merger::merge;

#[derive(Clone, Debug)]
pub struct RunOptions {
    pub selection: MarketSelection,
    /// Refresh the market snapshot before ranking.
    pub fetch: bool,
    /// Refresh the primary venue's pair list before ranking.
    pub refresh_pairs: bool,
    /// Map this venue's listings onto `match_onto` and rank the result.
    pub match_from: Option<Venue>,
    /// Venue whose pairs are written for `match_from`; the primary venue when unset.
    pub match_onto: Option<Venue>,
    /// Refresh and rank another venue's own listing.
    pub exchange: Option<Venue>,
    /// Keep only `exchange` pairs whose coin the primary venue list also has.
    pub filter_against_primary: bool,
}

impl RunOptions {
    pub fn new(selection: MarketSelection) -> Self {
        Self {
            selection,
            fetch: false,
            refresh_pairs: false,
            match_from: None,
            match_onto: None,
            exchange: None,
            filter_against_primary: true,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SortedList {
    pub path: PathBuf,
    pub ranked: usize,
    pub leftover: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct CrossVenueSummary {
    pub source: Venue,
    pub target: Venue,
    pub matched: usize,
    pub special: usize,
    pub unmatched: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub selection: MarketSelection,
    pub snapshot_records: Option<usize>,
    pub pairs_refreshed: Option<usize>,
    pub venue_pairs: Option<usize>,
    pub cross_venue: Option<CrossVenueSummary>,
    pub sorted: Vec<SortedList>,
    pub finished_at: DateTime<Utc>,
}

pub struct Pipeline {
    config: AppConfig,
    store: FlatFileStore,
    market: Arc<dyn MarketDataSupplier>,
    suppliers: Vec<Arc<dyn PairSupplier>>,
}

impl Pipeline {
    pub fn new(
        config: AppConfig,
        market: Arc<dyn MarketDataSupplier>,
        suppliers: Vec<Arc<dyn PairSupplier>>,
    ) -> Self {
        let store = FlatFileStore::new(config.data_dir.clone())
            .with_snapshot_file(&config.market_data.snapshot_file);
        Self {
            config,
            store,
            market,
            suppliers,
        }
    }

    /// Live suppliers for every configured venue.
    pub fn from_config(config: AppConfig) -> Result<Self, WatchlistError> {
        let market = Arc::new(CoinGeckoClient::new(
            config.market_data.clone(),
            &config.retry,
        )?);
        let suppliers = config
            .venues
            .iter()
            .map(|profile| build_pair_supplier(&config, profile.venue))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(config, market, suppliers))
    }

    pub fn store(&self) -> &FlatFileStore {
        &self.store
    }

    fn supplier(&self, venue: Venue) -> Result<&Arc<dyn PairSupplier>, WatchlistError> {
        self.suppliers
            .iter()
            .find(|s| s.venue() == venue)
            .ok_or_else(|| WatchlistError::Config(format!("no pair supplier for {}", venue)))
    }

    fn excluded_coins(&self, venue: Venue) -> Result<Vec<String>, WatchlistError> {
        Ok(self.config.venue(venue)?.excluded_coins.clone())
    }

    /// The file list a venue's own listing lives in.
    fn own_list(&self, venue: Venue) -> ListKind {
        if venue == self.config.primary_venue {
            ListKind::Primary
        } else {
            ListKind::Venue(venue)
        }
    }

    /// Venue whose decoration and exclusions apply to `list`.
    fn list_venue(&self, list: ListKind) -> Venue {
        match list {
            ListKind::Primary => self.config.primary_venue,
            ListKind::Venue(venue) => venue,
            ListKind::Matched { onto, .. } => onto.unwrap_or(self.config.primary_venue),
        }
    }

    pub async fn run(&self, opts: &RunOptions) -> Result<RunSummary, WatchlistError> {
        let selection = &opts.selection;
        let primary = self.config.primary_venue;
        info!(
            "[PIPELINE] Starting {} (fetch: {}, get pairs: {}, match from: {:?}, exchange: {:?})",
            selection, opts.fetch, opts.refresh_pairs, opts.match_from, opts.exchange
        );

        let mut summary = RunSummary {
            selection: selection.clone(),
            snapshot_records: None,
            pairs_refreshed: None,
            venue_pairs: None,
            cross_venue: None,
            sorted: Vec::new(),
            finished_at: Utc::now(),
        };

        // A failed fetch leaves the previous snapshot untouched.
        let ranked = if opts.fetch {
            let records = self.market.fetch_ranked().await?;
            self.store.save_snapshot(&records)?;
            summary.snapshot_records = Some(records.len());
            records
        } else {
            self.store.load_snapshot()?
        };
        let ranked = self.universe(ranked);

        // --exchange naming the primary venue is a plain pair refresh
        let refresh_pairs = opts.refresh_pairs || opts.exchange == Some(primary);
        let exchange = opts.exchange.filter(|venue| *venue != primary);

        if refresh_pairs {
            summary.pairs_refreshed = Some(self.refresh_pairs(selection).await?);
        }

        if let Some(venue) = exchange {
            let count = self
                .refresh_venue_pairs(selection, venue, opts.filter_against_primary)
                .await?;
            summary.venue_pairs = Some(count);
            summary
                .sorted
                .push(self.sort_list(&ranked, selection, ListKind::Venue(venue))?);
        }

        if let Some(source) = opts.match_from {
            let target = opts.match_onto.unwrap_or(primary);
            let result = self.build_cross_venue_list(selection, source, target).await?;
            summary.cross_venue = Some(CrossVenueSummary {
                source,
                target,
                matched: result.matched.len(),
                special: result.special_matches(),
                unmatched: result.unmatched_source.len(),
            });
            let list = ListKind::Matched {
                source,
                onto: (target != primary).then_some(target),
            };
            summary.sorted.push(self.sort_list(&ranked, selection, list)?);
        }

        if (opts.match_from.is_none() && exchange.is_none()) || refresh_pairs {
            summary
                .sorted
                .push(self.sort_list(&ranked, selection, ListKind::Primary)?);
        }

        summary.finished_at = Utc::now();
        info!("[PIPELINE] Completed {}", selection);
        Ok(summary)
    }

    fn universe(&self, mut records: Vec<CoinRecord>) -> Vec<CoinRecord> {
        records.truncate(self.config.universe_limit);
        records
    }

    /// Fetches the primary venue's pairs and replaces its list file.
    pub async fn refresh_pairs(&self, selection: &MarketSelection) -> Result<usize, WatchlistError> {
        let venue = self.config.primary_venue;
        let pairs = self
            .supplier(venue)?
            .fetch_pairs(&selection.quote, selection.kind)
            .await?;
        self.write_pairs(venue, &pairs, selection, ListKind::Primary)
    }

    /// Fetches another venue's pairs and replaces its own list file
    /// (`bybit_usdt_swap_pairs.txt`). With `filter_against_primary`, pairs
    /// whose coin the primary venue list lacks are dropped; an empty primary
    /// list disables the filter.
    pub async fn refresh_venue_pairs(
        &self,
        selection: &MarketSelection,
        venue: Venue,
        filter_against_primary: bool,
    ) -> Result<usize, WatchlistError> {
        let mut pairs = self
            .supplier(venue)?
            .fetch_pairs(&selection.quote, selection.kind)
            .await?;

        if filter_against_primary {
            let primary = self.config.primary_venue;
            let listed = self.listed_pairs(selection, primary, ListKind::Primary)?;
            if listed.is_empty() {
                warn!("[PIPELINE] No {} pairs on file, keeping every {} pair", primary, venue);
            } else {
                let normalizer = self.config.normalizer_for(primary)?;
                let result = match_pairs(&pairs, &listed, &[], &normalizer);
                info!(
                    "[PIPELINE] {} pairs also on {}: {} kept, {} only on {}",
                    venue,
                    primary,
                    result.matched.len(),
                    result.unmatched_source.len(),
                    venue
                );
                pairs = result.sources();
            }
        }

        self.write_pairs(venue, &pairs, selection, ListKind::Venue(venue))
    }

    /// `source` pairs (in its native quote when it has one) mapped onto
    /// `target`'s listing for `selection`, written as the matched list.
    /// The target's list file is used when present, its API otherwise.
    pub async fn build_cross_venue_list(
        &self,
        selection: &MarketSelection,
        source: Venue,
        target: Venue,
    ) -> Result<MatchResult, WatchlistError> {
        let source_profile = self.config.venue(source)?;
        let source_quote = source_profile
            .native_quote
            .clone()
            .unwrap_or_else(|| selection.quote.clone());

        let source_pairs = self
            .supplier(source)?
            .fetch_pairs(&source_quote, selection.kind)
            .await?;
        info!("[PIPELINE] {} pairs: {} found", source, source_pairs.len());

        let own_list = self.own_list(target);
        let mut target_pairs = self.listed_pairs(selection, target, own_list)?;
        if target_pairs.is_empty() {
            info!(
                "[PIPELINE] No pairs in {}, fetching from {} instead",
                self.store.pairs_path(selection, own_list).display(),
                target
            );
            target_pairs = self
                .supplier(target)?
                .fetch_pairs(&selection.quote, selection.kind)
                .await?;
        }

        let mut excluded = self.excluded_coins(target)?;
        excluded.extend(source_profile.excluded_coins.iter().cloned());

        let normalizer = self.config.normalizer_for(target)?;
        let result = match_pairs(&source_pairs, &target_pairs, &excluded, &normalizer);
        info!(
            "[PIPELINE] {} -> {}: {} matched ({} special), {} not on {}",
            source,
            target,
            result.matched.len(),
            result.special_matches(),
            result.unmatched_source.len(),
            target
        );

        let list = ListKind::Matched {
            source,
            onto: (target != self.config.primary_venue).then_some(target),
        };
        self.write_pairs(target, &result.targets(), selection, list)?;
        Ok(result)
    }

    /// Ranks one pair list against `ranked` and replaces its sorted file.
    pub fn sort_list(
        &self,
        ranked: &[CoinRecord],
        selection: &MarketSelection,
        list: ListKind,
    ) -> Result<SortedList, WatchlistError> {
        let input = self.store.pairs_path(selection, list);
        let output = self.store.sorted_path(selection, list);
        let venue = self.list_venue(list);

        let lines = self.store.read_lines(&input)?;
        let normalizer = self.config.normalizer_for(venue)?;
        let excluded = self.excluded_coins(venue)?;
        let outcome = merge(ranked, &lines, &selection.quote, &excluded, &normalizer);

        self.store.write_lines(&output, &outcome.lines)?;
        Ok(SortedList {
            path: output,
            ranked: outcome.ranked,
            leftover: outcome.leftover,
        })
    }

    /// Pairs read back from a list file in `venue`'s decoration.
    fn listed_pairs(
        &self,
        selection: &MarketSelection,
        venue: Venue,
        list: ListKind,
    ) -> Result<Vec<Pair>, WatchlistError> {
        let decoration = self.config.venue(venue)?.decoration();
        Ok(self
            .store
            .read_lines(&self.store.pairs_path(selection, list))?
            .iter()
            .map(|line| decoration.parse_line(line, &selection.quote, selection.kind))
            .collect())
    }

    fn write_pairs(
        &self,
        venue: Venue,
        pairs: &[Pair],
        selection: &MarketSelection,
        list: ListKind,
    ) -> Result<usize, WatchlistError> {
        let decoration = self.config.venue(venue)?.decoration();
        let lines: Vec<String> = pairs.iter().map(|p| decoration.decorate(p)).collect();
        self.store
            .write_lines(&self.store.pairs_path(selection, list), &lines)?;
        Ok(lines.len())
    }
}
