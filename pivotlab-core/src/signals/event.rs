//! Signal events and the per-bar signal series they are read from.
//!
//! Events are immutable once emitted: they describe a market event at one
//! bar, never a downstream decision.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::Bar;

/// Per-bar directional flags in `{-1, 0, 1}`, aligned with the bar series.
pub type SignalSeries = Vec<i8>;

/// Direction of a signal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// `+1` → Buy, `-1` → Sell, anything else → no event.
    pub fn from_flag(flag: i8) -> Option<Self> {
        match flag {
            1 => Some(Self::Buy),
            -1 => Some(Self::Sell),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

/// A single signal at bar `index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    /// Producer name (model or rule).
    pub name: String,
    pub index: usize,
    pub timestamp: NaiveDateTime,
    /// Close of the signal bar.
    pub value: f64,
    pub side: Side,
    pub description: String,
}

impl SignalEvent {
    /// Event for `bars[index]`. Returns `None` if the index is out of range.
    pub fn at(
        bars: &[Bar],
        index: usize,
        name: impl Into<String>,
        side: Side,
        description: impl Into<String>,
    ) -> Option<Self> {
        let bar = bars.get(index)?;
        Some(Self {
            name: name.into(),
            index,
            timestamp: bar.timestamp,
            value: bar.close,
            side,
            description: description.into(),
        })
    }
}

/// Turn the non-zero entries of `series` into events, in bar order.
///
/// `describe` receives the side of each event. Entries beyond the bar series
/// are ignored.
pub fn events_from_series(
    bars: &[Bar],
    series: &[i8],
    name: &str,
    mut describe: impl FnMut(Side) -> String,
) -> Vec<SignalEvent> {
    series
        .iter()
        .enumerate()
        .filter_map(|(index, &flag)| {
            let side = Side::from_flag(flag)?;
            SignalEvent::at(bars, index, name, side, describe(side))
        })
        .collect()
}
