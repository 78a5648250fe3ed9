//! Pivot: a single-bar turning point emitted by a pivot detector.

use serde::{Deserialize, Serialize};

/// Which side of the market a turning point marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotKind {
    Support,
    Resistance,
}

/// A candidate turning point.
///
/// `index` addresses the bar series the pivot was detected on and always lies
/// in `[0, N)`. Pivots are transient: they only live until clustering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    pub price: f64,
    pub index: usize,
    pub kind: PivotKind,
}

impl Pivot {
    pub fn support(price: f64, index: usize) -> Self {
        Self {
            price,
            index,
            kind: PivotKind::Support,
        }
    }

    pub fn resistance(price: f64, index: usize) -> Self {
        Self {
            price,
            index,
            kind: PivotKind::Resistance,
        }
    }
}
