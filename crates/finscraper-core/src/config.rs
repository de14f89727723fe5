use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::http_client::DEFAULT_TIMEOUT_MS;

/// Default store location, relative to the working directory.
pub const DEFAULT_STORAGE_FILE: &str = "financial_data.json";

/// Default age after which a record no longer survives a failed refresh.
pub const DEFAULT_MAX_RECORD_AGE: Duration = Duration::from_secs(24 * 3_600);

/// Which sources the capability registry should enable.
///
/// # Environment Variables
///
/// | Setting | Primary Env Var | Fallback Env Var |
/// |---------|----------------|------------------|
/// | Alpha Vantage key | `FINSCRAPER_ALPHAVANTAGE_API_KEY` | `ALPHAVANTAGE_API_KEY` |
/// | Offline mode | `FINSCRAPER_OFFLINE` | - |
/// | No placeholder fallback | `FINSCRAPER_DISABLE_SYNTHETIC` | - |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub yahoo_enabled: bool,
    pub alphavantage_enabled: bool,
    pub alphavantage_api_key: Option<String>,
    pub synthetic_enabled: bool,
    /// Disables every networked source.
    pub offline: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            yahoo_enabled: true,
            alphavantage_enabled: true,
            alphavantage_api_key: None,
            synthetic_enabled: true,
            offline: false,
        }
    }
}

impl SourceConfig {
    /// Synthetic source only; never touches the network.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn with_alphavantage_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.alphavantage_api_key = (!key.trim().is_empty()).then_some(key);
        self
    }

    pub fn with_yahoo_enabled(mut self, enabled: bool) -> Self {
        self.yahoo_enabled = enabled;
        self
    }

    pub fn with_alphavantage_enabled(mut self, enabled: bool) -> Self {
        self.alphavantage_enabled = enabled;
        self
    }

    pub fn with_synthetic_enabled(mut self, enabled: bool) -> Self {
        self.synthetic_enabled = enabled;
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }
}

/// Facade configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScraperConfig {
    pub storage_file: PathBuf,
    /// Upper bound on a single source attempt.
    pub timeout_ms: u64,
    pub max_record_age: Duration,
    pub sources: SourceConfig,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            storage_file: PathBuf::from(DEFAULT_STORAGE_FILE),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_record_age: DEFAULT_MAX_RECORD_AGE,
            sources: SourceConfig::default(),
        }
    }
}

impl ScraperConfig {
    pub fn new(storage_file: impl AsRef<Path>) -> Self {
        Self {
            storage_file: storage_file.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Reads `FINSCRAPER_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("FINSCRAPER_STORAGE_FILE").filter(|v| !v.trim().is_empty()) {
            config.storage_file = PathBuf::from(path);
        }

        if let Some(raw) = lookup("FINSCRAPER_TIMEOUT_MS") {
            match raw.trim().parse::<u64>() {
                Ok(timeout_ms) if timeout_ms > 0 => config.timeout_ms = timeout_ms,
                _ => log::warn!(
                    "ignoring FINSCRAPER_TIMEOUT_MS={raw:?}; using {} ms",
                    config.timeout_ms
                ),
            }
        }

        if let Some(key) = lookup("FINSCRAPER_ALPHAVANTAGE_API_KEY")
            .or_else(|| lookup("ALPHAVANTAGE_API_KEY"))
        {
            config.sources = config.sources.with_alphavantage_key(key);
        }

        if lookup("FINSCRAPER_OFFLINE").is_some_and(|v| is_truthy(&v)) {
            config.sources.offline = true;
        }
        if lookup("FINSCRAPER_DISABLE_SYNTHETIC").is_some_and(|v| is_truthy(&v)) {
            config.sources.synthetic_enabled = false;
        }

        config
    }

    pub fn with_storage_file(mut self, storage_file: impl AsRef<Path>) -> Self {
        self.storage_file = storage_file.as_ref().to_path_buf();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms.max(1);
        self
    }

    pub fn with_max_record_age(mut self, max_record_age: Duration) -> Self {
        self.max_record_age = max_record_age;
        self
    }

    pub fn with_sources(mut self, sources: SourceConfig) -> Self {
        self.sources = sources;
        self
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
