//! Integration tests for the watchlist pipeline.
//! These tests run whole passes against stub suppliers and a temp data directory.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_watchlist::config::AppConfig;
use rust_watchlist::data::market::{CoinRecord, MarketDataSupplier, SupplierResult};
use rust_watchlist::data::store::ListKind;
use rust_watchlist::error::{SupplierError, WatchlistError};
use rust_watchlist::exchange::traits::PairSupplier;
use rust_watchlist::exchange::types::{MarketKind, MarketSelection, Pair, Venue};
use rust_watchlist::services::pipeline::{Pipeline, RunOptions};

struct StubMarket {
    records: Option<Vec<CoinRecord>>,
}

#[async_trait]
impl MarketDataSupplier for StubMarket {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn fetch_ranked(&self) -> SupplierResult<Vec<CoinRecord>> {
        match &self.records {
            Some(records) => Ok(records.clone()),
            None => Err(SupplierError::RetriesExhausted {
                supplier: "stub".to_string(),
                attempts: 5,
                last_error: "HTTP 429".to_string(),
            }),
        }
    }
}

struct StubVenue {
    venue: Venue,
    pairs: Vec<Pair>,
    calls: AtomicUsize,
}

impl StubVenue {
    fn new(venue: Venue, quote: &str, coins: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            venue,
            pairs: coins
                .iter()
                .map(|c| Pair::new(c, quote, MarketKind::Perpetual))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PairSupplier for StubVenue {
    fn venue(&self) -> Venue {
        self.venue
    }

    async fn fetch_pairs(&self, quote: &str, kind: MarketKind) -> SupplierResult<Vec<Pair>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .pairs
            .iter()
            .filter(|p| p.quote == quote && p.kind == kind)
            .cloned()
            .collect())
    }
}

fn snapshot() -> Vec<CoinRecord> {
    vec![
        CoinRecord::new("btc", 1, 100.0),
        CoinRecord::new("eth", 2, 50.0),
        CoinRecord::new("usdc", 6, 1000.0),
        CoinRecord::new("pepe", 30, 80.0),
    ]
}

fn config_in(dir: &Path) -> AppConfig {
    AppConfig {
        data_dir: dir.to_path_buf(),
        ..AppConfig::default()
    }
}

fn usdt_perp() -> MarketSelection {
    MarketSelection::new("USDT", MarketKind::Perpetual)
}

fn options(fetch: bool, refresh_pairs: bool, hyperliquid: bool) -> RunOptions {
    RunOptions {
        fetch,
        refresh_pairs,
        match_from: hyperliquid.then_some(Venue::Hyperliquid),
        ..RunOptions::new(usdt_perp())
    }
}

fn exchange_options(venue: Venue, filter_against_primary: bool) -> RunOptions {
    RunOptions {
        exchange: Some(venue),
        filter_against_primary,
        ..RunOptions::new(usdt_perp())
    }
}

fn hype_list() -> ListKind {
    ListKind::Matched {
        source: Venue::Hyperliquid,
        onto: None,
    }
}

fn read(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn binance_stub() -> Arc<StubVenue> {
    StubVenue::new(Venue::Binance, "USDT", &["ETH", "BTC", "1000PEPE", "USDC", "ZZZ"])
}

fn hyperliquid_stub() -> Arc<StubVenue> {
    StubVenue::new(Venue::Hyperliquid, "USDC", &["kPEPE", "BTC", "HYPE"])
}

fn bybit_stub() -> Arc<StubVenue> {
    StubVenue::new(Venue::Bybit, "USDT", &["BTC", "1000PEPE", "NEWCOIN"])
}

fn write_primary_list(pipeline: &Pipeline) {
    fs::write(
        pipeline.store().pairs_path(&usdt_perp(), ListKind::Primary),
        "BINANCE:ETHUSDTPERP\nBINANCE:BTCUSDTPERP\nBINANCE:1000PEPEUSDTPERP\n",
    )
    .unwrap();
}

/// Full refresh: fetch market data, refresh pairs, rank them.
#[tokio::test]
async fn test_fetch_refresh_and_sort() {
    let dir = tempfile::tempdir().unwrap();
    let market = Arc::new(StubMarket {
        records: Some(snapshot()),
    });
    let pipeline = Pipeline::new(
        config_in(dir.path()),
        market,
        vec![binance_stub(), hyperliquid_stub()],
    );

    let summary = pipeline.run(&options(true, true, false)).await.unwrap();

    assert_eq!(summary.snapshot_records, Some(4));
    assert_eq!(summary.pairs_refreshed, Some(5));
    assert!(pipeline.store().snapshot_path().exists());

    let pairs = read(&pipeline.store().pairs_path(&usdt_perp(), ListKind::Primary));
    assert_eq!(pairs[0], "BINANCE:ETHUSDTPERP");
    assert_eq!(pairs.len(), 5);

    let sorted = read(&pipeline.store().sorted_path(&usdt_perp(), ListKind::Primary));
    assert_eq!(
        sorted,
        vec![
            "BINANCE:BTCUSDTPERP",
            "BINANCE:1000PEPEUSDTPERP",
            "BINANCE:ETHUSDTPERP",
            "BINANCE:USDCUSDTPERP",
            "BINANCE:ZZZUSDTPERP",
        ]
    );
    assert_eq!(summary.sorted.len(), 1);
    assert_eq!(summary.sorted[0].ranked, 3);
    assert_eq!(summary.sorted[0].leftover, 2);
}

/// Without flags the cached snapshot and pair list are used as-is.
#[tokio::test]
async fn test_sort_from_cached_files() {
    let dir = tempfile::tempdir().unwrap();
    let market = Arc::new(StubMarket { records: None });
    let binance = binance_stub();
    let pipeline = Pipeline::new(config_in(dir.path()), market, vec![binance.clone()]);

    pipeline.store().save_snapshot(&snapshot()).unwrap();
    fs::write(
        pipeline.store().pairs_path(&usdt_perp(), ListKind::Primary),
        "BINANCE:ETHUSDTPERP\nBINANCE:XYZUSDTPERP\nBINANCE:BTCUSDTPERP\n",
    )
    .unwrap();

    let summary = pipeline.run(&options(false, false, false)).await.unwrap();

    assert_eq!(summary.snapshot_records, None);
    assert_eq!(binance.calls.load(Ordering::SeqCst), 0);
    let sorted = read(&pipeline.store().sorted_path(&usdt_perp(), ListKind::Primary));
    assert_eq!(
        sorted,
        vec![
            "BINANCE:BTCUSDTPERP",
            "BINANCE:ETHUSDTPERP",
            "BINANCE:XYZUSDTPERP",
        ]
    );
}

/// Re-running over the same inputs produces the same file.
#[tokio::test]
async fn test_rerun_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let market = Arc::new(StubMarket {
        records: Some(snapshot()),
    });
    let pipeline = Pipeline::new(config_in(dir.path()), market, vec![binance_stub()]);
    let sorted_path = pipeline.store().sorted_path(&usdt_perp(), ListKind::Primary);

    pipeline.run(&options(true, true, false)).await.unwrap();
    let first = fs::read_to_string(&sorted_path).unwrap();
    pipeline.run(&options(false, false, false)).await.unwrap();
    let second = fs::read_to_string(&sorted_path).unwrap();

    assert_eq!(first, second);
}

/// Hyperliquid pairs are mapped onto the cached venue list and ranked.
#[tokio::test]
async fn test_hyperliquid_list() {
    let dir = tempfile::tempdir().unwrap();
    let market = Arc::new(StubMarket { records: None });
    let binance = binance_stub();
    let pipeline = Pipeline::new(
        config_in(dir.path()),
        market,
        vec![binance.clone(), hyperliquid_stub()],
    );

    pipeline.store().save_snapshot(&snapshot()).unwrap();
    fs::write(
        pipeline.store().pairs_path(&usdt_perp(), ListKind::Primary),
        "BINANCE:ETHUSDTPERP\nBINANCE:BTCUSDTPERP\nBINANCE:1000PEPEUSDTPERP\n",
    )
    .unwrap();

    let summary = pipeline.run(&options(false, false, true)).await.unwrap();

    assert_eq!(binance.calls.load(Ordering::SeqCst), 0);
    let hl = summary.cross_venue.unwrap();
    assert_eq!(hl.matched, 2);
    assert_eq!(hl.special, 1);
    assert_eq!(hl.unmatched, 1);

    let hype_pairs = read(&pipeline.store().pairs_path(&usdt_perp(), hype_list()));
    assert_eq!(
        hype_pairs,
        vec!["BINANCE:1000PEPEUSDTPERP", "BINANCE:BTCUSDTPERP"]
    );

    let hype_sorted = read(&pipeline.store().sorted_path(&usdt_perp(), hype_list()));
    assert_eq!(
        hype_sorted,
        vec!["BINANCE:BTCUSDTPERP", "BINANCE:1000PEPEUSDTPERP"]
    );

    // only the hyperliquid list is sorted on a plain --hyperliquid run
    assert_eq!(summary.sorted.len(), 1);
    assert!(!pipeline
        .store()
        .sorted_path(&usdt_perp(), ListKind::Primary)
        .exists());
}

/// With no cached venue list the venue is queried directly.
#[tokio::test]
async fn test_hyperliquid_falls_back_to_venue_api() {
    let dir = tempfile::tempdir().unwrap();
    let market = Arc::new(StubMarket {
        records: Some(snapshot()),
    });
    let binance = binance_stub();
    let pipeline = Pipeline::new(
        config_in(dir.path()),
        market,
        vec![binance.clone(), hyperliquid_stub()],
    );

    let summary = pipeline.run(&options(true, false, true)).await.unwrap();

    assert_eq!(binance.calls.load(Ordering::SeqCst), 1);
    assert_eq!(summary.cross_venue.unwrap().matched, 2);
}

/// --get-pairs with --hyperliquid refreshes and sorts both lists.
#[tokio::test]
async fn test_hyperliquid_with_refresh_sorts_both() {
    let dir = tempfile::tempdir().unwrap();
    let market = Arc::new(StubMarket {
        records: Some(snapshot()),
    });
    let pipeline = Pipeline::new(
        config_in(dir.path()),
        market,
        vec![binance_stub(), hyperliquid_stub()],
    );

    let summary = pipeline.run(&options(true, true, true)).await.unwrap();

    assert_eq!(summary.sorted.len(), 2);
    assert!(pipeline
        .store()
        .sorted_path(&usdt_perp(), ListKind::Primary)
        .exists());
    assert!(pipeline
        .store()
        .sorted_path(&usdt_perp(), hype_list())
        .exists());
}

/// A failed fetch aborts before anything is written.
#[tokio::test]
async fn test_fetch_failure_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let market = Arc::new(StubMarket { records: None });
    let pipeline = Pipeline::new(config_in(dir.path()), market, vec![binance_stub()]);

    let err = pipeline.run(&options(true, true, false)).await.unwrap_err();

    assert!(matches!(err, WatchlistError::SupplierUnavailable(_)));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

/// A failed fetch keeps the previous snapshot.
#[tokio::test]
async fn test_fetch_failure_keeps_old_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let market = Arc::new(StubMarket { records: None });
    let pipeline = Pipeline::new(config_in(dir.path()), market, vec![binance_stub()]);
    pipeline.store().save_snapshot(&snapshot()).unwrap();

    assert!(pipeline.run(&options(true, false, false)).await.is_err());

    assert_eq!(pipeline.store().load_snapshot().unwrap(), snapshot());
}

/// Sorting without a snapshot is an error, not an empty ranking.
#[tokio::test]
async fn test_missing_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let market = Arc::new(StubMarket { records: None });
    let pipeline = Pipeline::new(config_in(dir.path()), market, vec![binance_stub()]);

    let err = pipeline.run(&options(false, false, false)).await.unwrap_err();

    assert!(matches!(err, WatchlistError::MissingSnapshot { .. }));
    assert!(!pipeline
        .store()
        .sorted_path(&usdt_perp(), ListKind::Primary)
        .exists());
}

/// Records past the universe limit never rank.
#[tokio::test]
async fn test_universe_limit() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        universe_limit: 2,
        ..config_in(dir.path())
    };
    let market = Arc::new(StubMarket {
        records: Some(snapshot()),
    });
    let pipeline = Pipeline::new(config, market, vec![binance_stub()]);

    let summary = pipeline.run(&options(true, true, false)).await.unwrap();

    let sorted = read(&pipeline.store().sorted_path(&usdt_perp(), ListKind::Primary));
    assert_eq!(sorted[0], "BINANCE:BTCUSDTPERP");
    assert_eq!(sorted[1], "BINANCE:ETHUSDTPERP");
    assert_eq!(summary.sorted[0].ranked, 2);
}

/// A missing pair list yields an empty sorted file.
#[tokio::test]
async fn test_missing_pair_list_writes_empty_sorted_file() {
    let dir = tempfile::tempdir().unwrap();
    let market = Arc::new(StubMarket {
        records: Some(snapshot()),
    });
    let pipeline = Pipeline::new(config_in(dir.path()), market, vec![binance_stub()]);

    let summary = pipeline.run(&options(true, false, false)).await.unwrap();

    assert_eq!(summary.sorted[0].ranked, 0);
    let path = pipeline.store().sorted_path(&usdt_perp(), ListKind::Primary);
    assert_eq!(fs::read_to_string(path).unwrap(), "");
}

/// Of several listings for one coin the last in the file is matched.
#[tokio::test]
async fn test_hyperliquid_uses_last_duplicate_listing() {
    let dir = tempfile::tempdir().unwrap();
    let market = Arc::new(StubMarket { records: None });
    let pipeline = Pipeline::new(
        config_in(dir.path()),
        market,
        vec![binance_stub(), hyperliquid_stub()],
    );

    pipeline.store().save_snapshot(&snapshot()).unwrap();
    fs::write(
        pipeline.store().pairs_path(&usdt_perp(), ListKind::Primary),
        "BINANCE:PEPEUSDTPERP\nBINANCE:1000PEPEUSDTPERP\n",
    )
    .unwrap();

    pipeline.run(&options(false, false, true)).await.unwrap();

    let hype_pairs = read(&pipeline.store().pairs_path(&usdt_perp(), hype_list()));
    assert_eq!(hype_pairs, vec!["BINANCE:1000PEPEUSDTPERP"]);
}

/// --exchange bybit keeps the bybit pairs the primary list also has.
#[tokio::test]
async fn test_exchange_list_filtered_against_primary() {
    let dir = tempfile::tempdir().unwrap();
    let market = Arc::new(StubMarket { records: None });
    let binance = binance_stub();
    let pipeline = Pipeline::new(
        config_in(dir.path()),
        market,
        vec![binance.clone(), bybit_stub()],
    );
    pipeline.store().save_snapshot(&snapshot()).unwrap();
    write_primary_list(&pipeline);

    let summary = pipeline
        .run(&exchange_options(Venue::Bybit, true))
        .await
        .unwrap();

    assert_eq!(binance.calls.load(Ordering::SeqCst), 0);
    assert_eq!(summary.venue_pairs, Some(2));
    assert_eq!(summary.pairs_refreshed, None);

    let bybit = ListKind::Venue(Venue::Bybit);
    assert!(dir.path().join("bybit_usdt_swap_pairs.txt").exists());
    assert_eq!(
        read(&pipeline.store().pairs_path(&usdt_perp(), bybit)),
        vec!["BYBIT:BTCUSDTPERP", "BYBIT:1000PEPEUSDTPERP"]
    );
    assert_eq!(
        read(&dir.path().join("sorted_bybit_usdt_swap.txt")),
        vec!["BYBIT:BTCUSDTPERP", "BYBIT:1000PEPEUSDTPERP"]
    );

    // only the bybit list is ranked
    assert_eq!(summary.sorted.len(), 1);
    assert!(!pipeline
        .store()
        .sorted_path(&usdt_perp(), ListKind::Primary)
        .exists());
}

/// --unfiltered writes every bybit pair.
#[tokio::test]
async fn test_exchange_list_unfiltered() {
    let dir = tempfile::tempdir().unwrap();
    let market = Arc::new(StubMarket { records: None });
    let pipeline = Pipeline::new(config_in(dir.path()), market, vec![binance_stub(), bybit_stub()]);
    pipeline.store().save_snapshot(&snapshot()).unwrap();
    write_primary_list(&pipeline);

    let summary = pipeline
        .run(&exchange_options(Venue::Bybit, false))
        .await
        .unwrap();

    assert_eq!(summary.venue_pairs, Some(3));
    let pairs = read(&pipeline.store().pairs_path(&usdt_perp(), ListKind::Venue(Venue::Bybit)));
    assert_eq!(
        pairs,
        vec!["BYBIT:BTCUSDTPERP", "BYBIT:1000PEPEUSDTPERP", "BYBIT:NEWCOINUSDTPERP"]
    );
}

/// With no primary list on file there is nothing to filter against.
#[tokio::test]
async fn test_exchange_list_without_primary_file_keeps_everything() {
    let dir = tempfile::tempdir().unwrap();
    let market = Arc::new(StubMarket { records: None });
    let pipeline = Pipeline::new(config_in(dir.path()), market, vec![binance_stub(), bybit_stub()]);
    pipeline.store().save_snapshot(&snapshot()).unwrap();

    let summary = pipeline
        .run(&exchange_options(Venue::Bybit, true))
        .await
        .unwrap();

    assert_eq!(summary.venue_pairs, Some(3));
}

/// --exchange naming the primary venue refreshes the primary list.
#[tokio::test]
async fn test_exchange_primary_is_a_pair_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let market = Arc::new(StubMarket { records: None });
    let binance = binance_stub();
    let pipeline = Pipeline::new(config_in(dir.path()), market, vec![binance.clone()]);
    pipeline.store().save_snapshot(&snapshot()).unwrap();

    let summary = pipeline
        .run(&exchange_options(Venue::Binance, true))
        .await
        .unwrap();

    assert_eq!(binance.calls.load(Ordering::SeqCst), 1);
    assert_eq!(summary.pairs_refreshed, Some(5));
    assert_eq!(summary.venue_pairs, None);
    assert_eq!(summary.sorted.len(), 1);
}

/// Bybit listings mapped onto the primary list land in usdt_swap_bybit_pairs.txt.
#[tokio::test]
async fn test_match_from_bybit_onto_primary() {
    let dir = tempfile::tempdir().unwrap();
    let market = Arc::new(StubMarket { records: None });
    let pipeline = Pipeline::new(config_in(dir.path()), market, vec![binance_stub(), bybit_stub()]);
    pipeline.store().save_snapshot(&snapshot()).unwrap();
    write_primary_list(&pipeline);

    let opts = RunOptions {
        match_from: Some(Venue::Bybit),
        ..RunOptions::new(usdt_perp())
    };
    let summary = pipeline.run(&opts).await.unwrap();

    let cross = summary.cross_venue.unwrap();
    assert_eq!(cross.source, Venue::Bybit);
    assert_eq!(cross.target, Venue::Binance);
    assert_eq!(cross.matched, 2);
    assert_eq!(cross.unmatched, 1);

    assert_eq!(
        read(&dir.path().join("usdt_swap_bybit_pairs.txt")),
        vec!["BINANCE:BTCUSDTPERP", "BINANCE:1000PEPEUSDTPERP"]
    );
    assert!(dir.path().join("sorted_usdt_swap_bybit.txt").exists());
}

/// Hyperliquid listings mapped onto bybit use bybit's naming and list files.
#[tokio::test]
async fn test_match_hyperliquid_onto_bybit() {
    let dir = tempfile::tempdir().unwrap();
    let market = Arc::new(StubMarket { records: None });
    let bybit = bybit_stub();
    let pipeline = Pipeline::new(
        config_in(dir.path()),
        market,
        vec![binance_stub(), bybit.clone(), hyperliquid_stub()],
    );
    pipeline.store().save_snapshot(&snapshot()).unwrap();
    write_primary_list(&pipeline);

    let opts = RunOptions {
        match_from: Some(Venue::Hyperliquid),
        match_onto: Some(Venue::Bybit),
        ..RunOptions::new(usdt_perp())
    };
    let summary = pipeline.run(&opts).await.unwrap();

    // no bybit list on file, so bybit is queried
    assert_eq!(bybit.calls.load(Ordering::SeqCst), 1);
    let cross = summary.cross_venue.unwrap();
    assert_eq!(cross.target, Venue::Bybit);
    assert_eq!(cross.matched, 2);
    assert_eq!(cross.special, 1);

    let list = ListKind::Matched {
        source: Venue::Hyperliquid,
        onto: Some(Venue::Bybit),
    };
    assert_eq!(
        read(&pipeline.store().pairs_path(&usdt_perp(), list)),
        vec!["BYBIT:1000PEPEUSDTPERP", "BYBIT:BTCUSDTPERP"]
    );
    assert_eq!(
        read(&dir.path().join("sorted_bybit_usdt_swap_hype.txt")),
        vec!["BYBIT:BTCUSDTPERP", "BYBIT:1000PEPEUSDTPERP"]
    );
    assert!(!dir.path().join("usdt_swap_hype_pairs.txt").exists());
}
