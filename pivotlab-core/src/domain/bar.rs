//! Bar, the fundamental market data unit, and the validated bar series.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use thiserror::Error;

/// One OHLCV record.
///
/// The timestamp is the ordering key of a [`BarSeries`]; every algorithm in
/// this crate addresses bars by position, never by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns true if any OHLCV field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// Basic OHLCV sanity check: positive prices, `low <= open/close <= high`,
    /// non-negative volume.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low > 0.0
            && self.volume >= 0.0
    }

    /// Value of a single column.
    pub fn get(&self, column: BarColumn) -> f64 {
        match column {
            BarColumn::Open => self.open,
            BarColumn::High => self.high,
            BarColumn::Low => self.low,
            BarColumn::Close => self.close,
            BarColumn::Volume => self.volume,
        }
    }
}

/// Raw bar columns usable as model features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarColumn {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl BarColumn {
    /// Case-insensitive lookup (`"Close"`, `"close"`, `"CLOSE"`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "open" => Some(Self::Open),
            "high" => Some(Self::High),
            "low" => Some(Self::Low),
            "close" => Some(Self::Close),
            "volume" => Some(Self::Volume),
            _ => None,
        }
    }
}

/// Errors raised while building a [`BarSeries`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar {index} does not have a strictly increasing timestamp")]
    NotStrictlyIncreasing { index: usize },

    #[error("bar {index} failed the OHLCV sanity check")]
    Insane { index: usize },
}

/// A contiguous, strictly-increasing-by-timestamp sequence of bars.
///
/// Derefs to `[Bar]`, so it can be handed to any function taking `&[Bar]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bar>", into = "Vec<Bar>")]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Validate ordering and per-bar sanity.
    pub fn new(bars: Vec<Bar>) -> Result<Self, BarError> {
        for (index, bar) in bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(BarError::Insane { index });
            }
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(BarError::NotStrictlyIncreasing { index });
            }
        }
        Ok(Self { bars })
    }

    pub fn as_slice(&self) -> &[Bar] {
        &self.bars
    }

    pub fn into_inner(self) -> Vec<Bar> {
        self.bars
    }

    pub fn column(&self, column: BarColumn) -> Vec<f64> {
        column_values(&self.bars, column)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.column(BarColumn::Close)
    }

    pub fn highs(&self) -> Vec<f64> {
        self.column(BarColumn::High)
    }

    pub fn lows(&self) -> Vec<f64> {
        self.column(BarColumn::Low)
    }
}

impl Deref for BarSeries {
    type Target = [Bar];

    fn deref(&self) -> &[Bar] {
        &self.bars
    }
}

impl TryFrom<Vec<Bar>> for BarSeries {
    type Error = BarError;

    fn try_from(bars: Vec<Bar>) -> Result<Self, Self::Error> {
        Self::new(bars)
    }
}

impl From<BarSeries> for Vec<Bar> {
    fn from(series: BarSeries) -> Self {
        series.bars
    }
}

/// Extract one column from a bar slice.
pub fn column_values(bars: &[Bar], column: BarColumn) -> Vec<f64> {
    bars.iter().map(|b| b.get(column)).collect()
}
