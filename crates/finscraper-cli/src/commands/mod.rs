mod data;
mod export;
mod stats;
mod tickers;

use finscraper_core::{ApiResult, FinancialDataApi, ScraperConfig};
use serde::Serialize;
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::{exit_code_for, CliError};

/// Rendered command result plus the process exit status it implies.
pub struct CommandOutput {
    pub data: Value,
    pub exit_code: u8,
}

impl CommandOutput {
    pub fn from_api<T: Serialize>(result: ApiResult<T>) -> Result<Self, CliError> {
        let exit_code = result.error_kind.map_or(0, exit_code_for);
        Ok(Self {
            data: serde_json::to_value(&result)?,
            exit_code,
        })
    }
}

pub async fn run(cli: &Cli) -> Result<CommandOutput, CliError> {
    let mut api = FinancialDataApi::new(config_from(cli))?;

    match &cli.command {
        Command::Add(args) => tickers::add(&mut api, args).await,
        Command::Remove(args) => tickers::remove(&mut api, args),
        Command::List => tickers::list(&api),
        Command::Validate(args) => tickers::validate(&api, args),
        Command::Clear => tickers::clear(&mut api),
        Command::Show(args) => data::show(&api, args),
        Command::Refresh(args) => data::refresh(&mut api, args).await,
        Command::Export(args) => export::run(&api, args),
        Command::Stats => stats::stats(&api),
        Command::Cleanup(args) => stats::cleanup(&mut api, args),
        Command::Sources => stats::sources(&api),
    }
}

/// Environment first, then flags on top.
fn config_from(cli: &Cli) -> ScraperConfig {
    let mut config = ScraperConfig::from_env();
    if let Some(path) = &cli.storage_file {
        config = config.with_storage_file(path);
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config = config.with_timeout_ms(timeout_ms);
    }
    if cli.offline {
        config.sources.offline = true;
    }
    if cli.no_synthetic {
        config.sources.synthetic_enabled = false;
    }
    config
}
