//! Random forest of gini decision trees.
//!
//! Each tree trains on a bootstrap resample and considers a random
//! sqrt(n_features) subset of features at every split. Class probabilities
//! are the mean of the per-tree leaf distributions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::MlError;
use crate::matrix::Matrix;
use crate::svm::argmax;

/// Random forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 20,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        probs: Vec<f32>,
    },
    Split {
        feature: usize,
        threshold: f32,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn leaf_probs<'a>(&'a self, sample: &[f32]) -> &'a [f32] {
        match self {
            Node::Leaf { probs } => probs,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if sample[*feature] <= *threshold {
                    left.leaf_probs(sample)
                } else {
                    right.leaf_probs(sample)
                }
            }
        }
    }
}

/// Bagged decision tree ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    params: RandomForestParams,
    trees: Vec<Node>,
    n_features: usize,
    n_classes: usize,
}

impl RandomForestClassifier {
    pub fn new(params: RandomForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
            n_features: 0,
            n_classes: 0,
        }
    }

    pub fn params(&self) -> &RandomForestParams {
        &self.params
    }

    pub fn fit(&mut self, x: &Matrix, y: &[usize], n_classes: usize) -> Result<(), MlError> {
        let (n, d) = x.shape();
        if n == 0 {
            return Err(MlError::EmptyDataset);
        }
        if y.len() != n {
            return Err(MlError::DimensionMismatch {
                expected: n,
                got: y.len(),
            });
        }
        if n_classes < 2 {
            return Err(MlError::TooFewClasses(n_classes));
        }

        let n_candidates = (d as f64).sqrt().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.params.seed);

        let mut trees = Vec::with_capacity(self.params.n_trees);
        for _ in 0..self.params.n_trees.max(1) {
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(self.grow(x, y, n_classes, &bootstrap, n_candidates, 0, &mut rng));
        }

        self.trees = trees;
        self.n_features = d;
        self.n_classes = n_classes;
        Ok(())
    }

    fn grow(
        &self,
        x: &Matrix,
        y: &[usize],
        n_classes: usize,
        indices: &[usize],
        n_candidates: usize,
        depth: usize,
        rng: &mut StdRng,
    ) -> Node {
        let counts = class_counts(y, indices, n_classes);
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

        if pure
            || depth >= self.params.max_depth
            || indices.len() < self.params.min_samples_split
        {
            return leaf(&counts);
        }

        let d = x.n_cols();
        let parent_gini = gini(&counts, indices.len());

        let mut best: Option<(usize, f32, f64)> = None;
        let features = sample_features(d, n_candidates.min(d), rng);
        for &feature in &features {
            let mut values: Vec<f32> = indices.iter().map(|&i| x.get(i, feature)).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            values.dedup();

            for pair in values.windows(2) {
                let threshold = (pair[0] + pair[1]) / 2.0;
                let (lc, rc, ln, rn) = split_counts(x, y, indices, feature, threshold, n_classes);
                if ln < self.params.min_samples_leaf || rn < self.params.min_samples_leaf {
                    continue;
                }
                let weighted = (ln as f64 * gini(&lc, ln) + rn as f64 * gini(&rc, rn))
                    / indices.len() as f64;
                let gain = parent_gini - weighted;
                if gain > 1e-12 && best.map_or(true, |(_, _, g)| gain > g) {
                    best = Some((feature, threshold, gain));
                }
            }
        }

        let Some((feature, threshold, _)) = best else {
            return leaf(&counts);
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| x.get(i, feature) <= threshold);

        Node::Split {
            feature,
            threshold,
            left: Box::new(self.grow(x, y, n_classes, &left_idx, n_candidates, depth + 1, rng)),
            right: Box::new(self.grow(x, y, n_classes, &right_idx, n_candidates, depth + 1, rng)),
        }
    }

    pub fn predict_proba(&self, x: &Matrix) -> Result<Vec<Vec<f64>>, MlError> {
        if self.trees.is_empty() {
            return Err(MlError::NotFitted);
        }
        if x.n_cols() != self.n_features {
            return Err(MlError::DimensionMismatch {
                expected: self.n_features,
                got: x.n_cols(),
            });
        }

        let mut out = Vec::with_capacity(x.n_rows());
        for i in 0..x.n_rows() {
            let sample = x.row(i);
            let mut acc = vec![0.0f64; self.n_classes];
            for tree in &self.trees {
                for (slot, &p) in acc.iter_mut().zip(tree.leaf_probs(sample)) {
                    *slot += p as f64;
                }
            }
            let inv = 1.0 / self.trees.len() as f64;
            for slot in acc.iter_mut() {
                *slot *= inv;
            }
            out.push(acc);
        }
        Ok(out)
    }

    pub fn predict(&self, x: &Matrix) -> Result<Vec<usize>, MlError> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| argmax(&p))
            .collect())
    }
}

fn class_counts(y: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in indices {
        counts[y[i]] += 1;
    }
    counts
}

fn leaf(counts: &[usize]) -> Node {
    let total: usize = counts.iter().sum();
    let probs = counts
        .iter()
        .map(|&c| if total > 0 { c as f32 / total as f32 } else { 0.0 })
        .collect();
    Node::Leaf { probs }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let mut acc = 1.0;
    for &c in counts {
        let p = c as f64 / total as f64;
        acc -= p * p;
    }
    acc
}

fn split_counts(
    x: &Matrix,
    y: &[usize],
    indices: &[usize],
    feature: usize,
    threshold: f32,
    n_classes: usize,
) -> (Vec<usize>, Vec<usize>, usize, usize) {
    let mut left = vec![0usize; n_classes];
    let mut right = vec![0usize; n_classes];
    let (mut ln, mut rn) = (0usize, 0usize);
    for &i in indices {
        if x.get(i, feature) <= threshold {
            left[y[i]] += 1;
            ln += 1;
        } else {
            right[y[i]] += 1;
            rn += 1;
        }
    }
    (left, right, ln, rn)
}

/// Samples `k` distinct feature indices.
fn sample_features(d: usize, k: usize, rng: &mut StdRng) -> Vec<usize> {
    rand::seq::index::sample(rng, d, k).into_vec()
}
