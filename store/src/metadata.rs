use serde::{Deserialize, Serialize};

use voxid_ml::ModelType;

/// Cross-validation results recorded alongside a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationMeta {
    pub cv_scores: Vec<f64>,
    pub cv_mean: f64,
    pub cv_std: f64,
    pub cv_folds: usize,
}

/// Immutable record describing one training run.
///
/// Written next to the model file as a JSON sidecar, read back at load
/// time, and used only for best-model ranking and reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_type: ModelType,
    pub feature_type: String,
    /// Flattened feature vector length.
    pub feature_dim: usize,
    pub num_speakers: usize,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub precision_macro: f64,
    pub recall_macro: f64,
    pub f1_macro: f64,
    pub precision_weighted: f64,
    pub recall_weighted: f64,
    pub f1_weighted: f64,
    /// Rows are truth, columns predictions, over the sorted speaker list.
    pub confusion_matrix: Vec<Vec<usize>>,
    /// Sorted speaker labels; the row/column order of `confusion_matrix`.
    pub speakers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_validation: Option<CrossValidationMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_hyperparameters: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperparameter_tuning_method: Option<String>,
}
