use finscraper_core::FinancialDataApi;

use crate::cli::{AddArgs, TickerArg};
use crate::error::CliError;

use super::CommandOutput;

/// A single ticker goes through `add_ticker`; several are one batch.
pub async fn add(api: &mut FinancialDataApi, args: &AddArgs) -> Result<CommandOutput, CliError> {
    match args.tickers.as_slice() {
        [ticker] => CommandOutput::from_api(api.add_ticker(ticker).await),
        tickers => CommandOutput::from_api(api.batch_add_tickers(tickers).await),
    }
}

pub fn remove(api: &mut FinancialDataApi, args: &TickerArg) -> Result<CommandOutput, CliError> {
    CommandOutput::from_api(api.remove_ticker(&args.ticker))
}

pub fn list(api: &FinancialDataApi) -> Result<CommandOutput, CliError> {
    CommandOutput::from_api(api.get_ticker_list())
}

pub fn validate(api: &FinancialDataApi, args: &TickerArg) -> Result<CommandOutput, CliError> {
    let result = api.validate_ticker(&args.ticker);
    let mut output = CommandOutput::from_api(result)?;
    if output.data["valid"] == false {
        output.exit_code = 2;
    }
    Ok(output)
}

pub fn clear(api: &mut FinancialDataApi) -> Result<CommandOutput, CliError> {
    CommandOutput::from_api(api.clear_all())
}
