//! CSV file market data adapter.
//!
//! One file per symbol and timeframe: `<dir>/<SYMBOL>_<timeframe>.csv` with
//! header `date,open,high,low,close,volume[,vwap]`.

use crate::domain::asset::{Asset, Timeframe};
use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, timeframe))
    }

    /// Symbols with at least one data file, sorted and deduplicated.
    pub fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SigtraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SigtraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            let Some(stem) = name_str.strip_suffix(".csv") else {
                continue;
            };
            // symbols may contain '_' themselves; the timeframe never does
            if let Some((symbol, tf)) = stem.rsplit_once('_') {
                if tf.parse::<Timeframe>().is_ok() && !symbol.is_empty() {
                    symbols.push(symbol.to_string());
                }
            }
        }

        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }
}

fn parse_field<T>(record: &StringRecord, index: usize, name: &str) -> Result<T, SigtraderError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| SigtraderError::Data {
            reason: format!("missing {} column", name),
        })?
        .trim()
        .parse()
        .map_err(|e| SigtraderError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

/// Prices must be finite and strictly positive.
fn parse_price(record: &StringRecord, index: usize, name: &str) -> Result<f64, SigtraderError> {
    let value: f64 = parse_field(record, index, name)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(SigtraderError::Data {
            reason: format!("invalid {} value: {} (must be a positive number)", name, value),
        });
    }
    Ok(value)
}

fn parse_record(symbol: &str, record: &StringRecord) -> Result<OhlcvBar, SigtraderError> {
    let date_str = record.get(0).ok_or_else(|| SigtraderError::Data {
        reason: "missing date column".into(),
    })?;
    let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
        SigtraderError::Data {
            reason: format!("invalid date format: {}", e),
        }
    })?;

    let mut bar = OhlcvBar {
        symbol: symbol.to_string(),
        date,
        open: parse_price(record, 1, "open")?,
        high: parse_price(record, 2, "high")?,
        low: parse_price(record, 3, "low")?,
        close: parse_price(record, 4, "close")?,
        volume: parse_field(record, 5, "volume")?,
        vwap: None,
    };

    bar.vwap = match record.get(6).map(str::trim) {
        Some(v) if !v.is_empty() => Some(parse_field(record, 6, "vwap")?),
        _ => Some(bar.typical_price()),
    };
    Ok(bar)
}

impl MarketDataPort for CsvAdapter {
    fn search_assets(&self, query: &str, limit: usize) -> Result<Vec<Asset>, SigtraderError> {
        let needle = query.trim().to_uppercase();
        Ok(self
            .list_symbols()?
            .into_iter()
            .filter(|s| s.to_uppercase().contains(&needle))
            .take(limit)
            .map(|s| Asset::from_symbol(&s))
            .collect())
    }

    fn get_asset(&self, symbol: &str) -> Result<Option<Asset>, SigtraderError> {
        let known = self.list_symbols()?.iter().any(|s| s == symbol);
        Ok(known.then(|| Asset::from_symbol(symbol)))
    }

    fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SigtraderError> {
        let path = self.csv_path(symbol, timeframe);
        let content = fs::read_to_string(&path).map_err(|e| SigtraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| SigtraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            let bar = parse_record(symbol, &record)?;
            if bar.date < start_date || bar.date > end_date {
                continue;
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.date);
        if let Some(pair) = bars.windows(2).find(|pair| pair[1].date <= pair[0].date) {
            return Err(SigtraderError::Data {
                reason: format!("{}: duplicate bar for {}", path.display(), pair[1].date),
            });
        }
        debug!(symbol, %timeframe, bars = bars.len(), path = %path.display(), "loaded bars");
        Ok(bars)
    }
}
