//! CLI argument definitions for finscraper.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `add` | Track one or more tickers |
//! | `remove` | Stop tracking a ticker |
//! | `list` | List tracked tickers |
//! | `show` | Show cached data or a summary |
//! | `refresh` | Re-resolve one or all tickers |
//! | `export` | Export the snapshot to JSON, CSV or XLSX |
//! | `stats` | Store and feature statistics |
//! | `cleanup` | Evict stale records |
//! | `validate` | Check ticker syntax |
//! | `sources` | List data sources and their status |
//! | `clear` | Forget every ticker |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--storage-file` | `financial_data.json` | Store location |
//! | `--timeout-ms` | `10000` | Per-source attempt timeout |
//! | `--offline` | `false` | Synthetic source only |
//! | `--no-synthetic` | `false` | Disable placeholder fallback |
//! | `--pretty` | `false` | Pretty-print JSON output |
//!
//! # Examples
//!
//! ```bash
//! finscraper add AAPL MSFT GOOGL
//! finscraper show AAPL --pretty
//! finscraper export --format csv --output tickers.csv
//! RUST_LOG=debug finscraper refresh
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Track stock tickers and their financial data from multiple sources.
#[derive(Debug, Parser)]
#[command(
    name = "finscraper",
    author,
    version,
    about = "Track stock tickers and their financial data",
    long_about = "finscraper resolves tickers through Yahoo Finance, Alpha Vantage and an \
offline synthetic fallback, caches the results in a JSON store and exports them.\n\
\n\
Settings also come from FINSCRAPER_* environment variables; flags win.\n\
Use 'finscraper <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Store file (overrides FINSCRAPER_STORAGE_FILE).
    #[arg(long, global = true)]
    pub storage_file: Option<PathBuf>,

    /// Per-source attempt timeout in milliseconds (overrides FINSCRAPER_TIMEOUT_MS).
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Use only the synthetic source; never touch the network.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    /// Disable the synthetic placeholder fallback.
    #[arg(long, global = true, default_value_t = false)]
    pub no_synthetic: bool,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Track one or more tickers; several tickers are added as a batch.
    ///
    /// # Examples
    ///
    ///   finscraper add AAPL
    ///   finscraper add AAPL MSFT BRK.B
    Add(AddArgs),

    /// Stop tracking a ticker and drop its data.
    Remove(TickerArg),

    /// List tracked tickers in insertion order.
    List,

    /// Show cached data for all tickers or one ticker.
    Show(ShowArgs),

    /// Re-resolve one ticker, or all tracked tickers.
    Refresh(RefreshArgs),

    /// Export the current snapshot.
    ///
    /// # Examples
    ///
    ///   finscraper export --format json
    ///   finscraper export --format csv --output tickers.csv
    Export(ExportArgs),

    /// Show store statistics and available features.
    Stats,

    /// Evict records older than the given age.
    Cleanup(CleanupArgs),

    /// Check whether a ticker symbol is syntactically valid.
    Validate(TickerArg),

    /// List data sources, their priority and whether they are enabled.
    Sources,

    /// Forget every tracked ticker.
    Clear,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// One or more ticker symbols (e.g. AAPL, MSFT, BRK.B).
    #[arg(required = true, num_args = 1..)]
    pub tickers: Vec<String>,
}

#[derive(Debug, Args)]
pub struct TickerArg {
    pub ticker: String,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Ticker to show; all cached records when omitted.
    pub ticker: Option<String>,

    /// Show aggregate statistics instead of records.
    #[arg(long, default_value_t = false, conflicts_with = "ticker")]
    pub summary: bool,
}

#[derive(Debug, Args)]
pub struct RefreshArgs {
    /// Ticker to refresh; every tracked ticker when omitted.
    pub ticker: Option<String>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Export format: json, csv or xlsx (alias excel).
    #[arg(long, default_value = "json")]
    pub format: String,

    /// Output path; defaults to financial_data_<timestamp>.<ext> next to the store.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CleanupArgs {
    /// Maximum record age in hours.
    #[arg(long, default_value_t = 24)]
    pub max_age_hours: u64,
}
