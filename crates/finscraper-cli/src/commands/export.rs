//! Export the tracked snapshot to a file.

use finscraper_core::FinancialDataApi;

use crate::cli::ExportArgs;
use crate::error::CliError;

use super::CommandOutput;

pub fn run(api: &FinancialDataApi, args: &ExportArgs) -> Result<CommandOutput, CliError> {
    let result = api.export_data(&args.format, args.output.as_deref());
    if let Some(error) = &result.error {
        log::warn!("export failed: {error}");
    }
    CommandOutput::from_api(result)
}
