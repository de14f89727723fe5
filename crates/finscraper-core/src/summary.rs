use std::collections::BTreeMap;

use serde::Serialize;

use crate::FinancialRecord;

/// Bucket for records without a sector.
pub const UNKNOWN_SECTOR: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// Aggregate view over a set of records.
///
/// A record missing a field is skipped for that field's aggregate only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub total_tickers: usize,
    pub average_pe: Option<f64>,
    pub average_price: Option<f64>,
    pub pe_range: Option<ValueRange>,
    pub price_range: Option<ValueRange>,
    pub sectors: BTreeMap<String, usize>,
    pub synthetic_records: usize,
}

impl PortfolioSummary {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a FinancialRecord>,
    {
        let mut total_tickers = 0;
        let mut synthetic_records = 0;
        let mut pe_ratios = Vec::new();
        let mut prices = Vec::new();
        let mut sectors = BTreeMap::new();

        for record in records {
            total_tickers += 1;
            if record.synthetic {
                synthetic_records += 1;
            }
            pe_ratios.extend(record.pe_ratio.filter(|v| v.is_finite()));
            prices.extend(record.price.filter(|v| v.is_finite()));

            let sector = record.sector.as_deref().unwrap_or(UNKNOWN_SECTOR);
            *sectors.entry(sector.to_owned()).or_insert(0) += 1;
        }

        Self {
            total_tickers,
            average_pe: average(&pe_ratios),
            average_price: average(&prices),
            pe_range: range(&pe_ratios),
            price_range: range(&prices),
            sectors,
            synthetic_records,
        }
    }
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn range(values: &[f64]) -> Option<ValueRange> {
    let (first, rest) = values.split_first()?;
    Some(rest.iter().fold(
        ValueRange {
            min: *first,
            max: *first,
        },
        |acc, value| ValueRange {
            min: acc.min.min(*value),
            max: acc.max.max(*value),
        },
    ))
}
