use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::constants::{events, files};
use crate::data::market::CoinRecord;
use crate::error::WatchlistError;
use crate::exchange::types::{MarketSelection, Venue};

/// Which listing a pair-list file holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    /// Everything the primary venue lists for the selection.
    Primary,
    /// Another venue's own listing (`bybit_usdt_swap_pairs.txt`).
    Venue(Venue),
    /// Pairs of `onto` (the primary venue when `None`) that `source` also lists.
    Matched { source: Venue, onto: Option<Venue> },
}

/// Flat files under one data directory. Every write replaces the whole file.
#[derive(Clone, Debug)]
pub struct FlatFileStore {
    pub data_dir: PathBuf,
    snapshot_file: String,
}

impl FlatFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            snapshot_file: files::MARKET_SNAPSHOT.to_string(),
        }
    }

    pub fn with_snapshot_file(mut self, name: &str) -> Self {
        self.snapshot_file = name.to_string();
        self
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.snapshot_file)
    }

    /// `usdt_swap_pairs.txt`, `usdt_swap_hype_pairs.txt`, `bybit_usdt_swap_pairs.txt`, ...
    pub fn pairs_path(&self, selection: &MarketSelection, list: ListKind) -> PathBuf {
        self.data_dir
            .join(format!("{}_pairs.txt", Self::stem(selection, list)))
    }

    /// `sorted_usdt_swap.txt`, `sorted_usdt_swap_hype.txt`, ...
    pub fn sorted_path(&self, selection: &MarketSelection, list: ListKind) -> PathBuf {
        self.data_dir
            .join(format!("sorted_{}.txt", Self::stem(selection, list)))
    }

    fn stem(selection: &MarketSelection, list: ListKind) -> String {
        let market = format!(
            "{}_{}",
            selection.quote.to_lowercase(),
            selection.kind.file_tag()
        );
        match list {
            ListKind::Primary => market,
            ListKind::Venue(venue) => format!("{}_{}", venue.as_str(), market),
            ListKind::Matched { source, onto: None } => {
                format!("{}_{}", market, source.list_tag())
            }
            ListKind::Matched {
                source,
                onto: Some(venue),
            } => format!("{}_{}_{}", venue.as_str(), market, source.list_tag()),
        }
    }

    /// Non-blank lines as written, minus the line ending. A missing file is
    /// an empty list.
    pub fn read_lines(&self, path: &Path) -> Result<Vec<String>, WatchlistError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    event = events::PAIRS_FILE_MISSING,
                    "[STORE] {} not found, treating as empty",
                    path.display()
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(WatchlistError::io(path, e)),
        };

        let lines: Vec<String> = content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect();
        debug!("[STORE] Read {} lines from {}", lines.len(), path.display());
        Ok(lines)
    }

    /// One line per entry, newline after every line including the last.
    pub fn write_lines(&self, path: &Path, lines: &[String]) -> Result<(), WatchlistError> {
        let mut content = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in lines {
            content.push_str(line);
            content.push('\n');
        }
        fs::write(path, content).map_err(|e| WatchlistError::io(path, e))?;
        info!(
            event = events::PAIRS_SAVED,
            "[STORE] Wrote {} lines to {}",
            lines.len(),
            path.display()
        );
        Ok(())
    }

    pub fn load_snapshot(&self) -> Result<Vec<CoinRecord>, WatchlistError> {
        let path = self.snapshot_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(WatchlistError::MissingSnapshot { path });
            }
            Err(e) => return Err(WatchlistError::io(path, e)),
        };
        serde_json::from_str(&content).map_err(|error| WatchlistError::Snapshot { path, error })
    }

    pub fn save_snapshot(&self, records: &[CoinRecord]) -> Result<(), WatchlistError> {
        let path = self.snapshot_path();
        let json = serde_json::to_string(records).map_err(|error| WatchlistError::Snapshot {
            path: path.clone(),
            error,
        })?;
        fs::write(&path, json).map_err(|e| WatchlistError::io(&path, e))?;
        info!(
            event = events::SNAPSHOT_SAVED,
            "[STORE] Saved {} coin records to {}",
            records.len(),
            path.display()
        );
        Ok(())
    }
}
