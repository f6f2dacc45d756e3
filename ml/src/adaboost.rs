//! AdaBoost over decision stumps (multi-class SAMME).
//!
//! Each round fits the weighted-error-minimizing one-split stump, then
//! reweights samples toward the ones it got wrong. Class probabilities are
//! the normalized weighted votes of the ensemble.

use serde::{Deserialize, Serialize};

use crate::error::MlError;
use crate::matrix::Matrix;
use crate::svm::argmax;

/// AdaBoost hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaBoostParams {
    pub n_estimators: usize,
    pub learning_rate: f32,
}

impl Default for AdaBoostParams {
    fn default() -> Self {
        Self {
            n_estimators: 50,
            learning_rate: 1.0,
        }
    }
}

/// One-split weak learner: classifies by which side of a threshold the
/// sample falls on.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Stump {
    feature: usize,
    threshold: f32,
    left_class: usize,
    right_class: usize,
    weight: f64,
}

impl Stump {
    fn classify(&self, sample: &[f32]) -> usize {
        if sample[self.feature] <= self.threshold {
            self.left_class
        } else {
            self.right_class
        }
    }
}

/// SAMME-boosted stump ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoostClassifier {
    params: AdaBoostParams,
    stumps: Vec<Stump>,
    n_features: usize,
    n_classes: usize,
}

impl AdaBoostClassifier {
    pub fn new(params: AdaBoostParams) -> Self {
        Self {
            params,
            stumps: Vec::new(),
            n_features: 0,
            n_classes: 0,
        }
    }

    pub fn params(&self) -> &AdaBoostParams {
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

        let k = n_classes as f64;
        let random_error = 1.0 - 1.0 / k;
        let mut weights = vec![1.0f64 / n as f64; n];
        let mut stumps = Vec::new();

        for _ in 0..self.params.n_estimators.max(1) {
            let (mut stump, err) = best_stump(x, y, &weights, n_classes);

            if err >= random_error {
                // Weak learner no better than chance; stop boosting.
                break;
            }

            let clamped = err.max(1e-10);
            let alpha =
                self.params.learning_rate as f64 * (((1.0 - clamped) / clamped).ln() + (k - 1.0).ln());
            stump.weight = alpha;

            let perfect = err < 1e-10;
            if !perfect {
                for (i, w) in weights.iter_mut().enumerate() {
                    if stump.classify(x.row(i)) != y[i] {
                        *w *= alpha.exp();
                    }
                }
                let total: f64 = weights.iter().sum();
                for w in weights.iter_mut() {
                    *w /= total;
                }
            }

            stumps.push(stump);
            if perfect {
                break;
            }
        }

        if stumps.is_empty() {
            return Err(MlError::InvalidConfig(
                "no stump performed better than chance".to_string(),
            ));
        }

        self.stumps = stumps;
        self.n_features = d;
        self.n_classes = n_classes;
        Ok(())
    }

    pub fn predict_proba(&self, x: &Matrix) -> Result<Vec<Vec<f64>>, MlError> {
        if self.stumps.is_empty() {
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
            let mut votes = vec![0.0f64; self.n_classes];
            for stump in &self.stumps {
                votes[stump.classify(sample)] += stump.weight;
            }
            let total: f64 = votes.iter().sum();
            if total > 0.0 {
                for v in votes.iter_mut() {
                    *v /= total;
                }
            } else {
                votes.fill(1.0 / self.n_classes as f64);
            }
            out.push(votes);
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

/// Exhaustive weighted-error search over (feature, threshold) stumps.
///
/// Per feature: sort once, then sweep the boundary left-to-right keeping
/// running weighted class totals on each side.
fn best_stump(x: &Matrix, y: &[usize], weights: &[f64], n_classes: usize) -> (Stump, f64) {
    let (n, d) = x.shape();
    let total_per_class = {
        let mut t = vec![0.0f64; n_classes];
        for (i, &label) in y.iter().enumerate() {
            t[label] += weights[i];
        }
        t
    };
    let total: f64 = total_per_class.iter().sum();

    let mut best_err = f64::INFINITY;
    let mut best = Stump {
        feature: 0,
        threshold: 0.0,
        left_class: argmax(&total_per_class),
        right_class: argmax(&total_per_class),
        weight: 0.0,
    };

    let mut order: Vec<usize> = (0..n).collect();
    for feature in 0..d {
        order.sort_by(|&a, &b| {
            x.get(a, feature)
                .partial_cmp(&x.get(b, feature))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut left = vec![0.0f64; n_classes];
        let mut right = total_per_class.clone();

        for pos in 0..n - 1 {
            let i = order[pos];
            left[y[i]] += weights[i];
            right[y[i]] -= weights[i];

            let here = x.get(i, feature);
            let next = x.get(order[pos + 1], feature);
            if next <= here {
                continue;
            }

            let left_class = argmax(&left);
            let right_class = argmax(&right);
            let err = total - left[left_class] - right[right_class];
            if err < best_err {
                best_err = err;
                best = Stump {
                    feature,
                    threshold: (here + next) / 2.0,
                    left_class,
                    right_class,
                    weight: 0.0,
                };
            }
        }
    }

    (best, best_err.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clusters() -> (Matrix, Vec<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..8 {
            let j = i as f32 * 0.1;
            rows.push(vec![0.0 + j, 0.0]);
            labels.push(0);
            rows.push(vec![5.0 + j, 1.0]);
            labels.push(1);
        }
        (Matrix::from_rows(&rows).unwrap(), labels)
    }

    #[test]
    fn separates_clusters() {
        let (x, y) = clusters();
        let mut model = AdaBoostClassifier::new(AdaBoostParams::default());
        model.fit(&x, &y, 2).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn single_stump_suffices_on_separable_data() {
        // Perfectly separable along feature 0: the first stump has zero
        // error and boosting terminates immediately.
        let (x, y) = clusters();
        let mut model = AdaBoostClassifier::new(AdaBoostParams::default());
        model.fit(&x, &y, 2).unwrap();
        assert_eq!(model.stumps.len(), 1);
    }

    #[test]
    fn three_class_xor_like_data_needs_multiple_stumps() {
        let rows = vec![
            vec![0.0, 0.0],
            vec![0.5, 0.2],
            vec![5.0, 0.1],
            vec![5.5, 0.3],
            vec![2.5, 5.0],
            vec![3.0, 5.5],
        ];
        let y = vec![0, 0, 1, 1, 2, 2];
        let x = Matrix::from_rows(&rows).unwrap();

        let mut model = AdaBoostClassifier::new(AdaBoostParams::default());
        model.fit(&x, &y, 3).unwrap();
        assert!(model.stumps.len() > 1);
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn probabilities_are_distributions() {
        let (x, y) = clusters();
        let mut model = AdaBoostClassifier::new(AdaBoostParams::default());
        model.fit(&x, &y, 2).unwrap();
        for p in model.predict_proba(&x).unwrap() {
            assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn unfitted_errors() {
        let model = AdaBoostClassifier::new(AdaBoostParams::default());
        let x = Matrix::from_rows(&[vec![0.0, 0.0]]).unwrap();
        assert!(matches!(model.predict(&x), Err(MlError::NotFitted)));
    }
}
