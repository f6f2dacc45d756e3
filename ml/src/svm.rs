//! RBF-kernel support vector classifier.
//!
//! One-vs-rest binary margin classifiers trained with kernelized
//! Pegasos-style stochastic subgradient steps on the hinge loss. Class
//! probabilities come from a softmax over the per-class decision margins,
//! which preserves the probability ranking the predictor consumes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::MlError;
use crate::matrix::Matrix;

/// RBF kernel width selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gamma {
    /// `1 / (n_features * var(X))`.
    Scale,
    /// Fixed value.
    Value(f32),
}

/// SVM hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmParams {
    /// Regularization strength of the Pegasos objective.
    pub lambda: f32,
    pub gamma: Gamma,
    /// Passes over the training set.
    pub epochs: usize,
    pub seed: u64,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            lambda: 1e-3,
            gamma: Gamma::Scale,
            epochs: 200,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SvmState {
    support: Matrix,
    /// Per-class dual coefficients over the support set.
    coef: Vec<Vec<f32>>,
    gamma: f32,
    n_classes: usize,
}

/// RBF one-vs-rest support vector classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmClassifier {
    params: SvmParams,
    state: Option<SvmState>,
}

impl SvmClassifier {
    pub fn new(params: SvmParams) -> Self {
        Self {
            params,
            state: None,
        }
    }

    pub fn params(&self) -> &SvmParams {
        &self.params
    }

    pub fn n_classes(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.n_classes)
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

        let gamma = match self.params.gamma {
            Gamma::Value(g) => g,
            Gamma::Scale => {
                let var = variance(x.as_slice());
                if var > 0.0 {
                    1.0 / (d as f32 * var)
                } else {
                    1.0 / d as f32
                }
            }
        };

        // Gram matrix, shared by all one-vs-rest problems.
        let gram = rbf_gram(x, gamma);

        let lambda = self.params.lambda.max(1e-9);
        let steps = self.params.epochs.max(1) * n;
        let mut rng = StdRng::seed_from_u64(self.params.seed);

        let mut coef = Vec::with_capacity(n_classes);
        for class in 0..n_classes {
            let targets: Vec<f32> = y
                .iter()
                .map(|&label| if label == class { 1.0 } else { -1.0 })
                .collect();

            let mut alpha = vec![0.0f32; n];
            for t in 1..=steps {
                let i = rng.gen_range(0..n);
                let mut acc = 0.0f32;
                for j in 0..n {
                    if alpha[j] != 0.0 {
                        acc += alpha[j] * targets[j] * gram[j * n + i];
                    }
                }
                let margin = targets[i] * acc / (lambda * t as f32);
                if margin < 1.0 {
                    alpha[i] += 1.0;
                }
            }

            let scale = 1.0 / (lambda * steps as f32);
            coef.push(
                alpha
                    .iter()
                    .zip(&targets)
                    .map(|(&a, &ty)| a * ty * scale)
                    .collect(),
            );
        }

        self.state = Some(SvmState {
            support: x.clone(),
            coef,
            gamma,
            n_classes,
        });
        Ok(())
    }

    /// Per-class decision margins for one sample.
    fn decision(&self, state: &SvmState, sample: &[f32]) -> Vec<f64> {
        let n = state.support.n_rows();
        let mut kernel = vec![0.0f32; n];
        for (j, k) in kernel.iter_mut().enumerate() {
            let dist2 = squared_distance(state.support.row(j), sample);
            *k = (-state.gamma * dist2).exp();
        }

        state
            .coef
            .iter()
            .map(|c| {
                c.iter()
                    .zip(&kernel)
                    .map(|(&w, &k)| (w * k) as f64)
                    .sum::<f64>()
            })
            .collect()
    }

    pub fn predict_proba(&self, x: &Matrix) -> Result<Vec<Vec<f64>>, MlError> {
        let state = self.state.as_ref().ok_or(MlError::NotFitted)?;
        if x.n_cols() != state.support.n_cols() {
            return Err(MlError::DimensionMismatch {
                expected: state.support.n_cols(),
                got: x.n_cols(),
            });
        }

        let mut out = Vec::with_capacity(x.n_rows());
        for i in 0..x.n_rows() {
            let margins = self.decision(state, x.row(i));
            out.push(softmax(&margins));
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

fn variance(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    var as f32
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn rbf_gram(x: &Matrix, gamma: f32) -> Vec<f32> {
    let n = x.n_rows();
    let mut gram = vec![0.0f32; n * n];
    for i in 0..n {
        gram[i * n + i] = 1.0;
        for j in (i + 1)..n {
            let k = (-gamma * squared_distance(x.row(i), x.row(j))).exp();
            gram[i * n + j] = k;
            gram[j * n + i] = k;
        }
    }
    gram
}

pub(crate) fn softmax(values: &[f64]) -> Vec<f64> {
    let max = values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let exps: Vec<f64> = values.iter().map(|&v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
