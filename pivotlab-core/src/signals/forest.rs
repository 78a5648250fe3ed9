//! Random-forest classifier over the three signal classes `{-1, 0, 1}`.
//!
//! Trees are CART-style: binary splits on `feature <= threshold` with the
//! threshold at the midpoint between adjacent distinct values, chosen by Gini
//! gain over a random feature subset. Every tree gets its own bootstrap
//! sample and an RNG seeded with `seed + tree_index`, so fitting in parallel
//! is deterministic.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Class labels in index order.
pub const CLASSES: [i8; 3] = [-1, 0, 1];

fn class_index(label: i8) -> usize {
    match label {
        l if l < 0 => 0,
        0 => 1,
        _ => 2,
    }
}

/// Forest hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features tried per split; `None` means `sqrt(n_features)`.
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestConfig {
    fn features_per_split(&self, n_features: usize) -> usize {
        let k = self
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt() as usize);
        k.clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
enum TreeNode {
    Leaf {
        probs: [f64; 3],
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn probs(&self, row: &[f64]) -> [f64; 3] {
        let mut node = self;
        loop {
            match node {
                Self::Leaf { probs } => return *probs,
                Self::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = row.get(*feature).copied().unwrap_or(f64::NAN);
                    node = if value <= *threshold { left } else { right };
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            Self::Leaf { .. } => 0,
            Self::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// A fitted forest. Serializable so a trained model survives a save/load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedForest {
    /// Column order the forest was fitted on.
    pub feature_names: Vec<String>,
    trees: Vec<TreeNode>,
}

impl TrainedForest {
    /// Fit a forest on `rows` (one `Vec` per sample, all of equal width) and
    /// `labels` in `{-1, 0, 1}`.
    pub fn fit(
        config: &ForestConfig,
        feature_names: Vec<String>,
        rows: &[Vec<f64>],
        labels: &[i8],
    ) -> Self {
        let n_samples = rows.len().min(labels.len());
        let n_features = feature_names.len();
        let builder = TreeBuilder {
            rows,
            classes: labels.iter().map(|&l| class_index(l)).collect(),
            n_features,
            max_features: config.features_per_split(n_features),
            max_depth: config.max_depth.max(1),
            min_samples_split: config.min_samples_split.max(2),
            min_samples_leaf: config.min_samples_leaf.max(1),
        };

        let trees: Vec<TreeNode> = (0..config.n_trees.max(1))
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
                let sample: Vec<usize> = if config.bootstrap && n_samples > 0 {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                builder.build(&sample, 0, &mut rng)
            })
            .collect();

        tracing::debug!(
            trees = trees.len(),
            samples = n_samples,
            features = n_features,
            "forest fitted"
        );
        Self {
            feature_names,
            trees,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Deepest split chain over all trees (a lone leaf is depth 0).
    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(TreeNode::depth).max().unwrap_or(0)
    }

    /// Class probabilities averaged over all trees, in [`CLASSES`] order.
    pub fn predict_proba(&self, row: &[f64]) -> [f64; 3] {
        let mut sum = [0.0; 3];
        for tree in &self.trees {
            for (s, p) in sum.iter_mut().zip(tree.probs(row)) {
                *s += p;
            }
        }
        let n = self.trees.len().max(1) as f64;
        sum.map(|s| s / n)
    }

    /// Most probable class; ties go to the lower label.
    pub fn predict(&self, row: &[f64]) -> i8 {
        let probs = self.predict_proba(row);
        let mut best = 0;
        for k in 1..probs.len() {
            if probs[k] > probs[best] {
                best = k;
            }
        }
        CLASSES[best]
    }
}

struct TreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    classes: Vec<usize>,
    n_features: usize,
    max_features: usize,
    max_depth: usize,
    min_samples_split: usize,
    min_samples_leaf: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl TreeBuilder<'_> {
    fn counts(&self, sample: &[usize]) -> [usize; 3] {
        let mut counts = [0usize; 3];
        for &i in sample {
            counts[self.classes[i]] += 1;
        }
        counts
    }

    fn value(&self, sample: usize, feature: usize) -> f64 {
        self.rows[sample].get(feature).copied().unwrap_or(f64::NAN)
    }

    fn build(&self, sample: &[usize], depth: usize, rng: &mut StdRng) -> TreeNode {
        let counts = self.counts(sample);
        let impurity = gini(&counts);

        if depth >= self.max_depth || sample.len() < self.min_samples_split || impurity <= 0.0 {
            return leaf(&counts);
        }

        let Some(best) = self.best_split(sample, &counts, rng) else {
            return leaf(&counts);
        };

        let (left, right): (Vec<usize>, Vec<usize>) = sample
            .iter()
            .partition(|&&i| self.value(i, best.feature) <= best.threshold);

        TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(self.build(&left, depth + 1, rng)),
            right: Box::new(self.build(&right, depth + 1, rng)),
        }
    }

    /// Sorted sweep over each candidate feature, keeping running class counts
    /// on the left side.
    fn best_split(
        &self,
        sample: &[usize],
        counts: &[usize; 3],
        rng: &mut StdRng,
    ) -> Option<BestSplit> {
        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(rng);
        features.truncate(self.max_features);

        let n = sample.len();
        let parent = gini(counts);
        let mut best: Option<BestSplit> = None;

        for feature in features {
            let mut ordered: Vec<(f64, usize)> = sample
                .iter()
                .map(|&i| (self.value(i, feature), self.classes[i]))
                .filter(|(v, _)| !v.is_nan())
                .collect();
            if ordered.len() < n {
                continue;
            }
            ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left = [0usize; 3];
            for pos in 0..n - 1 {
                left[ordered[pos].1] += 1;
                let (here, next) = (ordered[pos].0, ordered[pos + 1].0);
                if here == next {
                    continue;
                }
                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }
                let right = [
                    counts[0] - left[0],
                    counts[1] - left[1],
                    counts[2] - left[2],
                ];
                let weighted =
                    (n_left as f64 * gini(&left) + n_right as f64 * gini(&right)) / n as f64;
                let gain = parent - weighted;
                if gain > best.as_ref().map_or(0.0, |b| b.gain) {
                    best = Some(BestSplit {
                        feature,
                        threshold: (here + next) / 2.0,
                        gain,
                    });
                }
            }
        }
        best
    }
}

fn gini(counts: &[usize; 3]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

fn leaf(counts: &[usize; 3]) -> TreeNode {
    let total = counts.iter().sum::<usize>().max(1) as f64;
    TreeNode::Leaf {
        probs: (*counts).map(|c| c as f64 / total),
    }
}
