//! Capability registry.
//!
//! Built once at startup: every known source gets a [`SourceDescriptor`]
//! saying whether it is enabled and why not, and only the enabled adapters
//! are handed to the resolver, already sorted by priority.
//!
//! ```rust,ignore
//! use finscraper_core::{SourceConfig, SourceRegistry};
//!
//! let registry = SourceRegistry::from_config(&SourceConfig::offline(), 5_000);
//! for descriptor in registry.descriptors() {
//!     println!("{} enabled={}", descriptor.id, descriptor.enabled);
//! }
//! ```

use std::sync::Arc;

use crate::adapters::{AlphaVantageAdapter, SyntheticAdapter, YahooAdapter};
use crate::data_source::DataSource;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::{SourceConfig, SourceDescriptor, SourceId};

/// Registry of known sources and the enabled adapters in priority order.
#[derive(Clone)]
pub struct SourceRegistry {
    descriptors: Vec<SourceDescriptor>,
    adapters: Vec<Arc<dyn DataSource>>,
}

impl SourceRegistry {
    pub fn builder() -> SourceRegistryBuilder {
        SourceRegistryBuilder::default()
    }

    /// Builds the production registry with a shared reqwest transport.
    pub fn from_config(config: &SourceConfig, timeout_ms: u64) -> Self {
        Self::from_config_with_client(config, timeout_ms, Arc::new(ReqwestHttpClient::new()))
    }

    pub fn from_config_with_client(
        config: &SourceConfig,
        timeout_ms: u64,
        http_client: Arc<dyn HttpClient>,
    ) -> Self {
        let mut builder = Self::builder();

        let yahoo = SourceId::Yahoo;
        builder = if config.offline {
            builder.register_disabled(yahoo, yahoo.default_priority(), "offline mode")
        } else if !config.yahoo_enabled {
            builder.register_disabled(yahoo, yahoo.default_priority(), "disabled by configuration")
        } else {
            builder.register(
                Arc::new(YahooAdapter::new(http_client.clone()).with_timeout_ms(timeout_ms)),
                yahoo.default_priority(),
            )
        };

        let alphavantage = SourceId::Alphavantage;
        let priority = alphavantage.default_priority();
        builder = match (&config.alphavantage_api_key, config.offline) {
            (_, true) => builder.register_disabled(alphavantage, priority, "offline mode"),
            _ if !config.alphavantage_enabled => {
                builder.register_disabled(alphavantage, priority, "disabled by configuration")
            }
            (None, false) => {
                builder.register_disabled(alphavantage, priority, "no API key configured")
            }
            (Some(key), false) => builder.register(
                Arc::new(
                    AlphaVantageAdapter::new(http_client, key.clone()).with_timeout_ms(timeout_ms),
                ),
                priority,
            ),
        };

        let synthetic = SourceId::Synthetic;
        builder = if config.synthetic_enabled {
            builder.register_with_note(
                Arc::new(SyntheticAdapter),
                synthetic.default_priority(),
                "placeholder values, records are flagged synthetic",
            )
        } else {
            builder.register_disabled(
                synthetic,
                synthetic.default_priority(),
                "placeholder fallback disabled",
            )
        };

        builder.build()
    }

    /// Every known source, enabled or not, in priority order.
    pub fn descriptors(&self) -> &[SourceDescriptor] {
        &self.descriptors
    }

    pub fn enabled(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.descriptors.iter().filter(|descriptor| descriptor.enabled)
    }

    pub fn is_enabled(&self, id: SourceId) -> bool {
        self.enabled().any(|descriptor| descriptor.id == id)
    }

    /// Enabled adapters in ascending priority order.
    pub fn adapters(&self) -> &[Arc<dyn DataSource>] {
        &self.adapters
    }

    pub fn source_count(&self) -> usize {
        self.adapters.len()
    }

    /// True when a networked source is enabled.
    pub fn has_live_sources(&self) -> bool {
        self.enabled()
            .any(|descriptor| descriptor.id != SourceId::Synthetic)
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("descriptors", &self.descriptors)
            .finish()
    }
}

/// Builder for [`SourceRegistry`].
#[derive(Default)]
pub struct SourceRegistryBuilder {
    entries: Vec<(SourceDescriptor, Option<Arc<dyn DataSource>>)>,
}

impl SourceRegistryBuilder {
    /// Registers an enabled adapter. A later registration for the same
    /// source replaces the earlier one.
    pub fn register(self, adapter: Arc<dyn DataSource>, priority: u16) -> Self {
        let descriptor = SourceDescriptor::enabled(adapter.id(), priority);
        self.insert(descriptor, Some(adapter))
    }

    pub fn register_with_note(
        self,
        adapter: Arc<dyn DataSource>,
        priority: u16,
        note: impl Into<String>,
    ) -> Self {
        let descriptor = SourceDescriptor::enabled(adapter.id(), priority).with_note(note);
        self.insert(descriptor, Some(adapter))
    }

    /// Records a known source that must never be attempted.
    pub fn register_disabled(self, id: SourceId, priority: u16, reason: impl Into<String>) -> Self {
        self.insert(SourceDescriptor::disabled(id, priority, reason), None)
    }

    fn insert(
        mut self,
        descriptor: SourceDescriptor,
        adapter: Option<Arc<dyn DataSource>>,
    ) -> Self {
        self.entries.retain(|(existing, _)| existing.id != descriptor.id);
        self.entries.push((descriptor, adapter));
        self
    }

    pub fn build(mut self) -> SourceRegistry {
        // Ties keep their `SourceId` order so the chain is total.
        self.entries
            .sort_by_key(|(descriptor, _)| (descriptor.priority, descriptor.id));

        let mut descriptors = Vec::with_capacity(self.entries.len());
        let mut adapters = Vec::new();
        for (descriptor, adapter) in self.entries {
            if let (true, Some(adapter)) = (descriptor.enabled, adapter) {
                adapters.push(adapter);
            }
            descriptors.push(descriptor);
        }

        SourceRegistry {
            descriptors,
            adapters,
        }
    }
}
