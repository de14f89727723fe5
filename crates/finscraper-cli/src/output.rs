use std::io::Write;

use serde_json::Value;

use crate::error::CliError;

/// Writes `data` to stdout as one JSON document.
pub fn render(data: &Value, pretty: bool) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if pretty {
        serde_json::to_writer_pretty(&mut handle, data)?;
    } else {
        serde_json::to_writer(&mut handle, data)?;
    }
    writeln!(handle)?;
    Ok(())
}
