use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::io::Read;
use std::str::FromStr;
use tracing::{debug, warn};

use pairs_trading_core::{PricePoint, PriceSeries};

use super::file::resolve_path;

/// Column selection for a wide price CSV (one row per date, one column per
/// ticker).
#[derive(Debug, Clone)]
pub struct PriceColumns<'a> {
    pub date: &'a str,
    pub asset1: &'a str,
    pub asset2: &'a str,
}

/// Load two price columns from a CSV file into a sorted, aligned series.
pub fn read_price_csv(
    path: &str,
    columns: &PriceColumns<'_>,
) -> Result<PriceSeries, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let file = std::fs::File::open(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    parse_price_csv(file, columns)
        .map_err(|e| format!("Failed to load prices from '{}': {}", canonical.display(), e).into())
}

/// Rows with an empty or non-numeric price on either leg are dropped, then
/// the remaining rows are sorted by date.
pub fn parse_price_csv<R: Read>(
    reader: R,
    columns: &PriceColumns<'_>,
) -> Result<PriceSeries, Box<dyn std::error::Error>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let index_of = |name: &str| -> Result<usize, Box<dyn std::error::Error>> {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            let available: Vec<&str> = headers.iter().collect();
            format!(
                "column '{}' not found (available: {})",
                name,
                available.join(", ")
            )
            .into()
        })
    };
    let date_idx = index_of(columns.date)?;
    let a1_idx = index_of(columns.asset1)?;
    let a2_idx = index_of(columns.asset2)?;

    let mut points = Vec::new();
    let mut dropped = 0usize;
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let raw_date = record.get(date_idx).unwrap_or_default();
        let date = parse_date(raw_date)
            .ok_or_else(|| format!("row {}: unparseable date '{}'", row + 2, raw_date))?;
        match (
            parse_price(record.get(a1_idx)),
            parse_price(record.get(a2_idx)),
        ) {
            (Some(asset1), Some(asset2)) => points.push(PricePoint {
                date,
                asset1,
                asset2,
            }),
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!(dropped, "dropped rows with a missing price");
    }
    points.sort_by_key(|p| p.date);
    debug!(rows = points.len(), "loaded price csv");
    Ok(PriceSeries::new(points))
}

/// Accepts `YYYY-MM-DD` and the `YYYY-MM-DD HH:MM:SS` form pandas writes
/// for a DatetimeIndex.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

fn parse_price(raw: Option<&str>) -> Option<Decimal> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}
