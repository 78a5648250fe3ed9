//! Bar loading for the runner.
//!
//! Two sources:
//! 1. A CSV file with a `timestamp,open,high,low,close,volume` header
//!    (Yahoo-style `Date,Open,...` headers are accepted too)
//! 2. A synthetic random walk, for demos and tests
//!
//! Synthetic data is a developer-only mode; reports built on it are tagged.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;

use pivotlab_core::domain::{Bar, BarError, BarSeries};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unrecognised timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("no bars in input")]
    Empty,

    #[error("invalid bar series: {0}")]
    Bars(#[from] BarError),
}

/// Bars plus their provenance.
#[derive(Debug, Clone)]
pub struct LoadedBars {
    pub bars: BarSeries,
    /// BLAKE3 over every timestamp and OHLCV value.
    pub dataset_hash: String,
    pub synthetic: bool,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Timestamp", alias = "Date", alias = "date", alias = "Datetime", alias = "datetime")]
    timestamp: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Load and validate a CSV bar file.
pub fn load_csv(path: &Path) -> Result<LoadedBars, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bars = read_csv(file)?;
    tracing::info!(path = %path.display(), bars = bars.len(), "bars loaded");
    Ok(LoadedBars {
        dataset_hash: dataset_hash(&bars),
        bars,
        synthetic: false,
    })
}

/// Parse CSV bars from any reader. Rows must already be in time order.
pub fn read_csv<R: Read>(reader: R) -> Result<BarSeries, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    for (row, record) in csv_reader.deserialize::<CsvRow>().enumerate() {
        let record = record?;
        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| LoadError::Timestamp {
            row,
            value: record.timestamp.clone(),
        })?;
        bars.push(Bar {
            timestamp,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }
    if bars.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(BarSeries::new(bars)?)
}

/// Deterministic BLAKE3 hash over all bar data.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.timestamp.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Synthetic daily bars for `label`, skipping weekends.
///
/// A random walk from 100.0 seeded from the label, so the same label always
/// yields the same series.
pub fn synthetic_bars(
    label: &str,
    start: NaiveDate,
    count: usize,
) -> Result<LoadedBars, LoadError> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    tracing::warn!(label, count, "generating synthetic bars; results will be tagged as synthetic");

    let seed: [u8; 32] = *blake3::hash(label.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::with_capacity(count);
    let mut price = 100.0_f64;
    let mut current = start;
    while bars.len() < count {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        bars.push(Bar {
            timestamp: current.and_time(chrono::NaiveTime::MIN),
            open,
            high: open.max(close) * (1.0 + rng.gen_range(0.0..0.01)),
            low: open.min(close) * (1.0 - rng.gen_range(0.0..0.01)),
            close,
            volume: rng.gen_range(500_000..5_000_000u64) as f64,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    let hash = dataset_hash(&bars);
    Ok(LoadedBars {
        bars: BarSeries::new(bars)?,
        dataset_hash: hash,
        synthetic: true,
    })
}
