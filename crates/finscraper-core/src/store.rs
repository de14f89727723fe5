//! Durable ticker → record store.
//!
//! The store file is a single JSON object:
//!
//! ```json
//! {
//!   "tickers": ["AAPL", "MSFT"],
//!   "data": { "AAPL": { "ticker": "AAPL", "price": 189.5, "...": "..." } },
//!   "last_updated": "2026-01-02T03:04:05Z"
//! }
//! ```
//!
//! `tickers` keeps insertion order; a tracked ticker may have no entry in
//! `data` until it resolves. Writes go to a sibling temp file that is then
//! renamed over the target, so a crash leaves either the old or the new
//! file, never a torn one.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::{FinancialRecord, StoreError, Ticker, UtcDateTime};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    tickers: Vec<String>,
    #[serde(default)]
    data: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    last_updated: Option<UtcDateTime>,
}

/// In-memory view of the store file plus its path.
///
/// Mutations change memory only and mark the store dirty; call
/// [`persist`](Self::persist) to write. Only a successful write clears the
/// dirty flag, so a change whose write failed is written by the next
/// [`persist_if_dirty`](Self::persist_if_dirty).
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    tickers: Vec<Ticker>,
    records: HashMap<Ticker, FinancialRecord>,
    last_updated: Option<UtcDateTime>,
    dirty: bool,
}

impl RecordStore {
    /// Empty store bound to `path`; nothing is read.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            tickers: Vec::new(),
            records: HashMap::new(),
            last_updated: None,
            dirty: false,
        }
    }

    /// Binds to `path` and loads whatever is there.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut store = Self::new(path);
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the in-memory state with the file contents. A missing or
    /// blank file yields an empty store. Entries with invalid tickers or
    /// unreadable records are skipped with a warning.
    pub fn load(&mut self) -> Result<(), StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("store {} does not exist yet", self.path.display());
                self.reset();
                return Ok(());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            self.reset();
            return Ok(());
        }

        let file: StoreFile =
            serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        self.reset();
        self.last_updated = file.last_updated;

        for raw in file.tickers {
            match Ticker::parse(&raw) {
                Ok(ticker) => {
                    self.track(ticker);
                }
                Err(error) => log::warn!("skipping stored ticker {raw:?}: {error}"),
            }
        }

        for (key, value) in file.data {
            let record = match FinancialRecord::from_json(value) {
                Ok(record) => record,
                Err(error) => {
                    log::warn!("skipping unreadable stored record {key:?}: {error}");
                    continue;
                }
            };
            if !record.ticker.as_str().eq_ignore_ascii_case(key.trim()) {
                log::warn!(
                    "skipping stored record keyed {key:?} that belongs to {}",
                    record.ticker
                );
                continue;
            }
            self.track(record.ticker.clone());
            self.records.insert(record.ticker.clone(), record);
        }

        self.dirty = false;
        log::debug!(
            "loaded {} tickers ({} cached) from {}",
            self.tickers.len(),
            self.records.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Writes the current state atomically (temp file + rename).
    pub fn persist(&mut self) -> Result<(), StoreError> {
        let now = UtcDateTime::now();
        let file = StoreFile {
            tickers: self.tickers.iter().map(|t| t.as_str().to_owned()).collect(),
            data: self
                .records
                .iter()
                .map(|(ticker, record)| {
                    record
                        .to_json()
                        .map(|value| (ticker.as_str().to_owned(), value))
                })
                .collect::<Result<_, serde_json::Error>>()?,
            last_updated: Some(now),
        };
        let body = serde_json::to_vec_pretty(&file)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let write_error = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        std::fs::create_dir_all(&dir).map_err(write_error)?;
        let mut temp = NamedTempFile::new_in(&dir).map_err(write_error)?;
        temp.write_all(&body).map_err(write_error)?;
        temp.as_file().sync_all().map_err(write_error)?;
        temp.persist(&self.path)
            .map_err(|error| write_error(error.error))?;

        self.last_updated = Some(now);
        self.dirty = false;
        log::info!(
            "persisted {} tickers to {}",
            self.tickers.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Writes only when something changed since the last successful write.
    pub fn persist_if_dirty(&mut self) -> Result<(), StoreError> {
        if self.dirty {
            self.persist()?;
        }
        Ok(())
    }

    /// True while in-memory changes have not reached disk.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn get(&self, ticker: &Ticker) -> Option<&FinancialRecord> {
        self.records.get(ticker)
    }

    /// Stores `record` stamped with the current time, replacing any previous
    /// one, and tracks its ticker.
    pub fn put(&mut self, record: FinancialRecord) {
        let source = record.source;
        self.restore(record.stamped(source, UtcDateTime::now()));
    }

    /// Like [`put`](Self::put) but keeps the record's own timestamp.
    pub fn restore(&mut self, record: FinancialRecord) {
        self.track(record.ticker.clone());
        self.records.insert(record.ticker.clone(), record);
        self.dirty = true;
    }

    /// Adds `ticker` to the tracked set. Returns false if already tracked.
    pub fn track(&mut self, ticker: Ticker) -> bool {
        if self.is_tracked(&ticker) {
            return false;
        }
        self.tickers.push(ticker);
        self.dirty = true;
        true
    }

    pub fn is_tracked(&self, ticker: &Ticker) -> bool {
        self.tickers.contains(ticker)
    }

    /// Untracks `ticker` and drops its record. Returns false if absent.
    pub fn remove(&mut self, ticker: &Ticker) -> bool {
        let before = self.tickers.len();
        self.tickers.retain(|tracked| tracked != ticker);
        let dropped = self.records.remove(ticker).is_some();
        let removed = before != self.tickers.len() || dropped;
        self.dirty |= removed;
        removed
    }

    /// Drops the record but keeps the ticker tracked.
    pub fn evict(&mut self, ticker: &Ticker) -> Option<FinancialRecord> {
        let evicted = self.records.remove(ticker);
        self.dirty |= evicted.is_some();
        evicted
    }

    pub fn clear(&mut self) {
        self.tickers.clear();
        self.records.clear();
        self.dirty = true;
    }

    /// Tracked tickers in insertion order.
    pub fn list_tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    /// Cached records in tracked order.
    pub fn records(&self) -> impl Iterator<Item = &FinancialRecord> {
        self.tickers
            .iter()
            .filter_map(|ticker| self.records.get(ticker))
    }

    /// Tracked tickers that have no record.
    pub fn unresolved(&self) -> impl Iterator<Item = &Ticker> {
        self.tickers
            .iter()
            .filter(|ticker| !self.records.contains_key(*ticker))
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn cached_len(&self) -> usize {
        self.records.len()
    }

    pub fn last_updated(&self) -> Option<UtcDateTime> {
        self.last_updated
    }

    /// Evicts records older than `max_age`. Returns the evicted tickers.
    pub fn cleanup_stale(&mut self, max_age: Duration) -> Vec<Ticker> {
        self.cleanup_stale_at(max_age, UtcDateTime::now())
    }

    pub fn cleanup_stale_at(&mut self, max_age: Duration, now: UtcDateTime) -> Vec<Ticker> {
        let stale: Vec<Ticker> = self
            .tickers
            .iter()
            .filter(|ticker| {
                self.records
                    .get(*ticker)
                    .is_some_and(|record| record.is_stale(max_age, now))
            })
            .cloned()
            .collect();

        for ticker in &stale {
            self.evict(ticker);
            log::warn!("evicted stale record for {ticker}");
        }
        stale
    }

    fn reset(&mut self) {
        self.tickers.clear();
        self.records.clear();
        self.last_updated = None;
        self.dirty = false;
    }
}
