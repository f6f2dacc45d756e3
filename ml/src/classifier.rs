use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::adaboost::{AdaBoostClassifier, AdaBoostParams};
use crate::error::MlError;
use crate::forest::{RandomForestClassifier, RandomForestParams};
use crate::matrix::Matrix;
use crate::mlp::{MlpClassifier, MlpParams};
use crate::svm::{Gamma, SvmClassifier, SvmParams};

/// The four supported classifier families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Svm,
    RandomForest,
    NeuralNetwork,
    AdaBoost,
}

impl ModelType {
    pub const ALL: [ModelType; 4] = [
        ModelType::Svm,
        ModelType::RandomForest,
        ModelType::NeuralNetwork,
        ModelType::AdaBoost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Svm => "svm",
            Self::RandomForest => "random_forest",
            Self::NeuralNetwork => "neural_network",
            Self::AdaBoost => "adaboost",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = MlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "svm" => Ok(Self::Svm),
            "random_forest" => Ok(Self::RandomForest),
            "neural_network" => Ok(Self::NeuralNetwork),
            "adaboost" => Ok(Self::AdaBoost),
            other => Err(MlError::InvalidConfig(format!(
                "unknown model type: {other:?}"
            ))),
        }
    }
}

/// Hyperparameters for one classifier family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelParams {
    Svm(SvmParams),
    RandomForest(RandomForestParams),
    NeuralNetwork(MlpParams),
    AdaBoost(AdaBoostParams),
}

impl ModelParams {
    pub fn defaults(model_type: ModelType) -> Self {
        match model_type {
            ModelType::Svm => Self::Svm(SvmParams::default()),
            ModelType::RandomForest => Self::RandomForest(RandomForestParams::default()),
            ModelType::NeuralNetwork => Self::NeuralNetwork(MlpParams::default()),
            ModelType::AdaBoost => Self::AdaBoost(AdaBoostParams::default()),
        }
    }

    pub fn model_type(&self) -> ModelType {
        match self {
            Self::Svm(_) => ModelType::Svm,
            Self::RandomForest(_) => ModelType::RandomForest,
            Self::NeuralNetwork(_) => ModelType::NeuralNetwork,
            Self::AdaBoost(_) => ModelType::AdaBoost,
        }
    }
}

/// A fitted (or fittable) classifier of any supported family.
///
/// The tagged enum is what gets persisted; the variant tells the loader
/// which family it is restoring without probing capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classifier {
    Svm(SvmClassifier),
    RandomForest(RandomForestClassifier),
    NeuralNetwork(MlpClassifier),
    AdaBoost(AdaBoostClassifier),
}

impl Classifier {
    /// Builds an unfitted classifier from hyperparameters.
    pub fn build(params: &ModelParams) -> Self {
        match params {
            ModelParams::Svm(p) => Self::Svm(SvmClassifier::new(p.clone())),
            ModelParams::RandomForest(p) => Self::RandomForest(RandomForestClassifier::new(p.clone())),
            ModelParams::NeuralNetwork(p) => Self::NeuralNetwork(MlpClassifier::new(p.clone())),
            ModelParams::AdaBoost(p) => Self::AdaBoost(AdaBoostClassifier::new(p.clone())),
        }
    }

    pub fn with_defaults(model_type: ModelType) -> Self {
        Self::build(&ModelParams::defaults(model_type))
    }

    pub fn model_type(&self) -> ModelType {
        match self {
            Self::Svm(_) => ModelType::Svm,
            Self::RandomForest(_) => ModelType::RandomForest,
            Self::NeuralNetwork(_) => ModelType::NeuralNetwork,
            Self::AdaBoost(_) => ModelType::AdaBoost,
        }
    }

    pub fn fit(&mut self, x: &Matrix, y: &[usize], n_classes: usize) -> Result<(), MlError> {
        match self {
            Self::Svm(m) => m.fit(x, y, n_classes),
            Self::RandomForest(m) => m.fit(x, y, n_classes),
            Self::NeuralNetwork(m) => m.fit(x, y, n_classes),
            Self::AdaBoost(m) => m.fit(x, y, n_classes),
        }
    }

    pub fn predict(&self, x: &Matrix) -> Result<Vec<usize>, MlError> {
        match self {
            Self::Svm(m) => m.predict(x),
            Self::RandomForest(m) => m.predict(x),
            Self::NeuralNetwork(m) => m.predict(x),
            Self::AdaBoost(m) => m.predict(x),
        }
    }

    /// Per-class probabilities, `[n_samples][n_classes]`, each row summing
    /// to 1.
    pub fn predict_proba(&self, x: &Matrix) -> Result<Vec<Vec<f64>>, MlError> {
        match self {
            Self::Svm(m) => m.predict_proba(x),
            Self::RandomForest(m) => m.predict_proba(x),
            Self::NeuralNetwork(m) => m.predict_proba(x),
            Self::AdaBoost(m) => m.predict_proba(x),
        }
    }
}

/// Hyperparameter search space for one model family.
///
/// A reduced cartesian product around the defaults; randomized search
/// samples from the same space.
pub fn param_grid(model_type: ModelType) -> Vec<ModelParams> {
    let mut grid = Vec::new();
    match model_type {
        ModelType::Svm => {
            for &lambda in &[1e-2f32, 1e-3, 1e-4] {
                for &gamma in &[Gamma::Scale, Gamma::Value(0.001), Gamma::Value(0.01), Gamma::Value(0.1)] {
                    grid.push(ModelParams::Svm(SvmParams {
                        lambda,
                        gamma,
                        ..SvmParams::default()
                    }));
                }
            }
        }
        ModelType::RandomForest => {
            for &n_trees in &[50usize, 100, 200] {
                for &max_depth in &[10usize, 20, 30] {
                    grid.push(ModelParams::RandomForest(RandomForestParams {
                        n_trees,
                        max_depth,
                        ..RandomForestParams::default()
                    }));
                }
            }
        }
        ModelType::NeuralNetwork => {
            for hidden in [vec![64], vec![128], vec![128, 64]] {
                for &alpha in &[1e-4f32, 1e-3, 1e-2] {
                    grid.push(ModelParams::NeuralNetwork(MlpParams {
                        hidden: hidden.clone(),
                        alpha,
                        ..MlpParams::default()
                    }));
                }
            }
        }
        ModelType::AdaBoost => {
            for &n_estimators in &[25usize, 50, 100] {
                for &learning_rate in &[0.5f32, 1.0, 1.5] {
                    grid.push(ModelParams::AdaBoost(AdaBoostParams {
                        n_estimators,
                        learning_rate,
                    }));
                }
            }
        }
    }
    grid
}
