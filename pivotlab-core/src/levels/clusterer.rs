//! One-dimensional complete-linkage clustering of pivot prices.

use serde::{Deserialize, Serialize};

use crate::domain::{Level, Pivot};

fn default_threshold_pct() -> f64 {
    0.015
}

/// Groups pivots into price bands.
///
/// Two pivots share a band only if every pair of members is at most
/// `mean_pivot_price * threshold_pct` apart. On a sorted price axis that is
/// the distance from the band's lowest member to its newest one, so a single
/// sweep suffices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelClusterer {
    #[serde(default = "default_threshold_pct")]
    pub threshold_pct: f64,
}

impl Default for LevelClusterer {
    fn default() -> Self {
        Self {
            threshold_pct: default_threshold_pct(),
        }
    }
}

impl LevelClusterer {
    pub fn new(threshold_pct: f64) -> Self {
        Self { threshold_pct }
    }

    /// Cluster `pivots` into levels sorted by descending strength.
    ///
    /// Each member contributes `1 + (index / total_bars) * recency_factor`
    /// to its level's strength, so recent pivots weigh more. With
    /// `total_bars == 0` every member contributes 1.
    pub fn cluster(&self, pivots: &[Pivot], total_bars: usize, recency_factor: f64) -> Vec<Level> {
        if pivots.is_empty() {
            return Vec::new();
        }

        let avg_price = pivots.iter().map(|p| p.price).sum::<f64>() / pivots.len() as f64;
        let distance_threshold = avg_price * self.threshold_pct;

        let mut sorted: Vec<&Pivot> = pivots.iter().collect();
        sorted.sort_by(|a, b| a.price.total_cmp(&b.price));

        let mut clusters: Vec<Vec<&Pivot>> = Vec::new();
        let mut current: Vec<&Pivot> = Vec::new();
        let mut cluster_min = f64::NAN;
        for pivot in sorted {
            if !current.is_empty() && pivot.price - cluster_min > distance_threshold {
                clusters.push(std::mem::take(&mut current));
            }
            if current.is_empty() {
                cluster_min = pivot.price;
            }
            current.push(pivot);
        }
        if !current.is_empty() {
            clusters.push(current);
        }

        let mut levels: Vec<Level> = clusters
            .iter()
            .map(|members| to_level(members, total_bars, recency_factor))
            .collect();
        // Vec::sort_by is stable: equal strengths keep ascending price order.
        levels.sort_by(|a, b| b.strength.total_cmp(&a.strength));

        tracing::debug!(
            pivots = pivots.len(),
            levels = levels.len(),
            distance_threshold,
            "pivots clustered"
        );
        levels
    }
}

fn to_level(members: &[&Pivot], total_bars: usize, recency_factor: f64) -> Level {
    let count = members.len();
    let mean = members.iter().map(|p| p.price).sum::<f64>() / count as f64;
    let min = members.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
    let max = members
        .iter()
        .map(|p| p.price)
        .fold(f64::NEG_INFINITY, f64::max);

    Level {
        price: round2(mean),
        min_price: round2(min),
        max_price: round2(max),
        strength: members
            .iter()
            .map(|p| time_weight(p.index, total_bars, recency_factor))
            .sum(),
        hit_count: count,
    }
}

/// Recency weight of a pivot at `index`.
pub fn time_weight(index: usize, total_bars: usize, recency_factor: f64) -> f64 {
    if total_bars == 0 {
        1.0
    } else {
        1.0 + (index as f64 / total_bars as f64) * recency_factor
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supports(points: &[(f64, usize)]) -> Vec<Pivot> {
        points.iter().map(|&(p, i)| Pivot::support(p, i)).collect()
    }

    #[test]
    fn empty_input() {
        assert!(LevelClusterer::new(0.02).cluster(&[], 100, 1.0).is_empty());
    }

    #[test]
    fn nearby_prices_merge_far_price_splits() {
        // mean 125.375, threshold 2.5075
        let pivots = supports(&[(100.0, 10), (100.5, 20), (101.0, 30), (200.0, 40)]);
        let levels = LevelClusterer::new(0.02).cluster(&pivots, 100, 1.0);
        assert_eq!(levels.len(), 2);

        let low = levels.iter().find(|l| l.price < 150.0).unwrap();
        assert_eq!(low.price, 100.5);
        assert_eq!(low.min_price, 100.0);
        assert_eq!(low.max_price, 101.0);
        assert_eq!(low.hit_count, 3);
        assert!((low.strength - 3.6).abs() < 1e-12);

        // The three-member band is strongest.
        assert_eq!(levels[0].hit_count, 3);
        assert!((levels[1].strength - 1.4).abs() < 1e-12);
    }

    #[test]
    fn linkage_is_complete_not_single() {
        // Each neighbour is within 2.0 of the next but the band would span 4.
        // mean 102, threshold 2.04: {100, 102} then {104}.
        let pivots = supports(&[(100.0, 0), (102.0, 0), (104.0, 0)]);
        let levels = LevelClusterer::new(0.02).cluster(&pivots, 10, 0.0);
        let mut counts: Vec<usize> = levels.iter().map(|l| l.hit_count).collect();
        counts.sort_unstable();
        assert_eq!(counts, vec![1, 2]);
    }

    #[test]
    fn boundary_distance_merges() {
        // mean 4, threshold exactly 2.0
        let pivots = supports(&[(3.0, 0), (5.0, 0)]);
        let levels = LevelClusterer::new(0.5).cluster(&pivots, 0, 1.0);
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].strength, 2.0);
    }

    #[test]
    fn recent_pivot_scores_higher() {
        let early = LevelClusterer::new(0.01).cluster(&supports(&[(50.0, 10)]), 100, 1.0);
        let late = LevelClusterer::new(0.01).cluster(&supports(&[(50.0, 90)]), 100, 1.0);
        assert!(late[0].strength > early[0].strength);
        assert!((late[0].strength - 1.9).abs() < 1e-12);
    }

    #[test]
    fn zero_total_bars_counts_hits() {
        let pivots = supports(&[(10.0, 3), (10.01, 7)]);
        let levels = LevelClusterer::new(0.01).cluster(&pivots, 0, 5.0);
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].strength, 2.0);
    }

    #[test]
    fn prices_are_rounded() {
        let pivots = supports(&[(10.004, 0), (10.011, 0), (10.012, 0)]);
        let levels = LevelClusterer::new(0.01).cluster(&pivots, 0, 0.0);
        assert_eq!(levels[0].min_price, 10.0);
        assert_eq!(levels[0].max_price, 10.01);
        assert_eq!(levels[0].price, 10.01);
    }

    #[test]
    fn equal_strength_keeps_price_order() {
        let pivots = supports(&[(300.0, 0), (100.0, 0), (200.0, 0)]);
        let levels = LevelClusterer::new(0.001).cluster(&pivots, 0, 0.0);
        let prices: Vec<f64> = levels.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn zero_recency_ignores_pivot_age() {
        let old = supports(&[(100.0, 1), (100.5, 2), (101.0, 3)]);
        let recent = supports(&[(100.0, 97), (100.5, 98), (101.0, 99)]);
        let clusterer = LevelClusterer::new(0.02);

        let old_levels = clusterer.cluster(&old, 100, 0.0);
        let recent_levels = clusterer.cluster(&recent, 100, 0.0);
        assert_eq!(old_levels.len(), 1);
        assert_eq!(recent_levels.len(), 1);
        assert_eq!(old_levels[0].strength, old_levels[0].hit_count as f64);
        assert_eq!(recent_levels[0].strength, recent_levels[0].hit_count as f64);
        assert_eq!(old_levels[0].strength, 3.0);
    }

    #[test]
    fn positive_recency_favours_recent_band() {
        let old = supports(&[(100.0, 1), (100.5, 2), (101.0, 3)]);
        let recent = supports(&[(100.0, 97), (100.5, 98), (101.0, 99)]);
        let clusterer = LevelClusterer::new(0.02);

        let old_strength = clusterer.cluster(&old, 100, 2.0)[0].strength;
        let recent_strength = clusterer.cluster(&recent, 100, 2.0)[0].strength;
        assert!(recent_strength > old_strength);
        // 3 + 2 * (1 + 2 + 3) / 100 and 3 + 2 * (97 + 98 + 99) / 100
        assert!((old_strength - 3.12).abs() < 1e-9);
        assert!((recent_strength - 8.88).abs() < 1e-9);
    }
}
