use finscraper_core::FinancialDataApi;

use crate::cli::CleanupArgs;
use crate::error::CliError;

use super::CommandOutput;

pub fn stats(api: &FinancialDataApi) -> Result<CommandOutput, CliError> {
    CommandOutput::from_api(api.get_stats())
}

pub fn cleanup(api: &mut FinancialDataApi, args: &CleanupArgs) -> Result<CommandOutput, CliError> {
    CommandOutput::from_api(api.cleanup_stale_data(args.max_age_hours))
}

pub fn sources(api: &FinancialDataApi) -> Result<CommandOutput, CliError> {
    CommandOutput::from_api(api.get_sources())
}
