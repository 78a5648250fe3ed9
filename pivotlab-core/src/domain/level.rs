//! Level: a clustered price band of pivots with a strength score.

use serde::{Deserialize, Serialize};

/// A support/resistance level.
///
/// Invariant: `min_price <= price <= max_price`, `hit_count >= 1`,
/// `strength >= 0`. Levels are recomputed from scratch on every analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Cluster centroid, rounded to 2 decimals.
    pub price: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// Sum of the (recency-weighted) contributions of all member pivots.
    pub strength: f64,
    pub hit_count: usize,
}

impl Level {
    /// Width of the price band.
    pub fn width(&self) -> f64 {
        self.max_price - self.min_price
    }

    /// True if `price` falls inside the band (inclusive).
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min_price && price <= self.max_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_level() -> Level {
        Level {
            price: 100.5,
            min_price: 100.0,
            max_price: 101.0,
            strength: 3.428_571_428_571_429,
            hit_count: 3,
        }
    }

    #[test]
    fn level_list_serialization_roundtrip_is_exact() {
        let levels = vec![
            sample_level(),
            Level {
                price: 200.0,
                min_price: 200.0,
                max_price: 200.0,
                strength: 1.0 + 17.0 / 23.0,
                hit_count: 1,
            },
        ];
        let json = serde_json::to_string(&levels).unwrap();
        let deser: Vec<Level> = serde_json::from_str(&json).unwrap();
        assert_eq!(levels, deser);
    }

    #[test]
    fn band_helpers() {
        let level = sample_level();
        assert!((level.width() - 1.0).abs() < 1e-12);
        assert!(level.contains(100.0));
        assert!(level.contains(101.0));
        assert!(!level.contains(101.01));
    }
}
