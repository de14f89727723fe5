//! Test doubles shared by the behaviour suites. Nothing here touches the
//! network.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use finscraper_core::{
    DataSource, FetchFuture, FinancialDataScraper, FinancialRecord, ScraperConfig, SourceError,
    SourceId, SourceRegistry, Ticker,
};

/// What a [`ScriptedSource`] does on its next fetch.
#[derive(Debug, Clone)]
pub enum Script {
    Succeed { price: f64 },
    Fail(SourceError),
    Hang,
}

/// Source double whose behaviour can be switched between calls.
pub struct ScriptedSource {
    id: SourceId,
    script: Mutex<Script>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn succeeding(id: SourceId, price: f64) -> Arc<Self> {
        Self::with_script(id, Script::Succeed { price })
    }

    pub fn failing(id: SourceId, error: SourceError) -> Arc<Self> {
        Self::with_script(id, Script::Fail(error))
    }

    pub fn with_script(id: SourceId, script: Script) -> Arc<Self> {
        Arc::new(Self {
            id,
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_script(&self, script: Script) {
        *self.script.lock().expect("script lock should not be poisoned") = script;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DataSource for ScriptedSource {
    fn id(&self) -> SourceId {
        self.id
    }

    fn fetch<'a>(&'a self, ticker: &'a Ticker) -> FetchFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .script
            .lock()
            .expect("script lock should not be poisoned")
            .clone();
        let id = self.id;

        Box::pin(async move {
            match script {
                Script::Succeed { price } => Ok(FinancialRecord::new(ticker.clone(), id)
                    .with_company_name(Some(format!("{} Holdings", ticker.as_str())))
                    .with_price(Some(price))
                    .with_pe_ratio(Some(15.0))
                    .with_sector(Some(String::from("Technology")))),
                Script::Fail(error) => Err(error),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(3_600)).await;
                    Err(SourceError::internal("hang script woke up"))
                }
            }
        })
    }
}

/// Registry with the given sources, priority in the order given.
pub fn registry_of(sources: Vec<Arc<dyn DataSource>>) -> SourceRegistry {
    sources
        .into_iter()
        .zip((0_u16..).step_by(10))
        .fold(SourceRegistry::builder(), |builder, (source, priority)| {
            builder.register(source, priority)
        })
        .build()
}

pub fn config_in(dir: &Path) -> ScraperConfig {
    ScraperConfig::new(dir.join("financial_data.json")).with_timeout_ms(2_000)
}

pub fn scraper_with(dir: &Path, sources: Vec<Arc<dyn DataSource>>) -> FinancialDataScraper {
    FinancialDataScraper::with_registry(config_in(dir), registry_of(sources))
        .expect("fresh store should open")
}
