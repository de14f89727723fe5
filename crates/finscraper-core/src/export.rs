//! Snapshot export to JSON, CSV and (with the `xlsx` feature) Excel.

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ExportError, FinancialRecord, UtcDateTime, ValidationError};

/// Column order shared by the CSV and spreadsheet writers.
pub const EXPORT_COLUMNS: [&str; 10] = [
    "ticker",
    "company_name",
    "price",
    "pe_ratio",
    "sector",
    "market_cap",
    "dividend_yield",
    "source",
    "synthetic",
    "timestamp",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    pub const fn extension(self) -> &'static str {
        self.as_str()
    }

    /// False when the writer for this format was compiled out.
    pub const fn is_available(self) -> bool {
        match self {
            Self::Json | Self::Csv => true,
            Self::Xlsx => cfg!(feature = "xlsx"),
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            other => Err(ValidationError::InvalidExportFormat {
                value: other.to_owned(),
            }),
        }
    }
}

/// `financial_data_<YYYYMMDD_HHMMSS>.<ext>` inside `dir`.
pub fn default_export_path(dir: &Path, format: ExportFormat, now: UtcDateTime) -> PathBuf {
    dir.join(format!(
        "financial_data_{}.{}",
        now.format_compact(),
        format.extension()
    ))
}

/// Writes `records` to `path` in `format`.
pub fn export_records(
    records: &[FinancialRecord],
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    if !format.is_available() {
        return Err(ExportError::FormatUnavailable(format.as_str()));
    }

    match format {
        ExportFormat::Json => write_json(records, path),
        ExportFormat::Csv => write_csv(records, path),
        ExportFormat::Xlsx => write_xlsx(records, path),
    }?;

    log::info!(
        "exported {} records as {format} to {}",
        records.len(),
        path.display()
    );
    Ok(())
}

/// Reads back a file produced by the JSON exporter.
pub fn read_json_export(path: &Path) -> Result<Vec<FinancialRecord>, ExportError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn write_json(records: &[FinancialRecord], path: &Path) -> Result<(), ExportError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn write_csv(records: &[FinancialRecord], path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(EXPORT_COLUMNS)?;
    for record in records {
        writer.write_record(row(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// One export row; absent values are empty cells.
fn row(record: &FinancialRecord) -> [String; 10] {
    let number = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
    [
        record.ticker.as_str().to_owned(),
        record.company_name.clone().unwrap_or_default(),
        number(record.price),
        number(record.pe_ratio),
        record.sector.clone().unwrap_or_default(),
        number(record.market_cap),
        number(record.dividend_yield),
        record.source.as_str().to_owned(),
        record.synthetic.to_string(),
        record.timestamp.format_rfc3339(),
    ]
}

#[cfg(feature = "xlsx")]
fn write_xlsx(records: &[FinancialRecord], path: &Path) -> Result<(), ExportError> {
    use rust_xlsxwriter::{Format, Workbook};

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Financial Data")?;
    let header = Format::new().set_bold();

    for (col, name) in (0_u16..).zip(EXPORT_COLUMNS) {
        sheet.write_string_with_format(0, col, name, &header)?;
    }

    for (row_index, record) in (1_u32..).zip(records) {
        let numbers = [
            (2_u16, record.price),
            (3, record.pe_ratio),
            (5, record.market_cap),
            (6, record.dividend_yield),
        ];
        sheet.write_string(row_index, 0, record.ticker.as_str())?;
        if let Some(name) = &record.company_name {
            sheet.write_string(row_index, 1, name)?;
        }
        if let Some(sector) = &record.sector {
            sheet.write_string(row_index, 4, sector)?;
        }
        for (col, value) in numbers {
            if let Some(value) = value {
                sheet.write_number(row_index, col, value)?;
            }
        }
        sheet.write_string(row_index, 7, record.source.as_str())?;
        sheet.write_boolean(row_index, 8, record.synthetic)?;
        sheet.write_string(row_index, 9, record.timestamp.format_rfc3339())?;
    }

    workbook.save(path)?;
    Ok(())
}

#[cfg(not(feature = "xlsx"))]
fn write_xlsx(_records: &[FinancialRecord], _path: &Path) -> Result<(), ExportError> {
    Err(ExportError::FormatUnavailable("xlsx"))
}
