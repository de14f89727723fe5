use finscraper_core::FinancialDataApi;

use crate::cli::{RefreshArgs, ShowArgs};
use crate::error::CliError;

use super::CommandOutput;

pub fn show(api: &FinancialDataApi, args: &ShowArgs) -> Result<CommandOutput, CliError> {
    if args.summary {
        return CommandOutput::from_api(api.get_summary());
    }
    CommandOutput::from_api(api.get_data(args.ticker.as_deref()))
}

pub async fn refresh(
    api: &mut FinancialDataApi,
    args: &RefreshArgs,
) -> Result<CommandOutput, CliError> {
    CommandOutput::from_api(api.refresh(args.ticker.as_deref()).await)
}
