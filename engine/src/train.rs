use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use voxid_features::{FeatureConfig, FeatureType};
use voxid_ml::model_selection::{
    SearchMethod, StratifiedKFold, cross_validate, hyperparameter_search,
    train_test_split_stratified,
};
use voxid_ml::metrics::{Average, accuracy, confusion_matrix, f1_score, precision, recall};
use voxid_ml::{Classifier, ModelParams, ModelType};
use voxid_store::{
    CrossValidationMeta, ModelMetadata, TrainedModel, model_filename, save_metadata, save_model,
    save_speaker_labels,
};

use crate::dataset::build_dataset;
use crate::error::EngineError;

/// Seed shared by the split, cross-validation, and search shuffles.
const TRAIN_SEED: u64 = 42;
/// Held-out fraction of the dataset.
const TEST_SIZE: f64 = 0.2;

/// Hyperparameter search strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningMethod {
    Grid,
    Random,
}

/// Optional hyperparameter tuning settings.
#[derive(Debug, Clone)]
pub struct TuningRequest {
    pub method: TuningMethod,
    /// Candidate budget for randomized search.
    pub n_iter: usize,
}

/// Everything a training run needs.
#[derive(Debug, Clone)]
pub struct TrainRequest {
    /// Directory of per-speaker sample subdirectories.
    pub data_dir: PathBuf,
    /// Directory receiving the model, metadata, and labels files.
    pub models_dir: PathBuf,
    pub model_type: ModelType,
    pub feature_type: FeatureType,
    /// Stratified k-fold cross-validation on the training split.
    pub cross_validation: Option<usize>,
    pub tuning: Option<TuningRequest>,
}

impl TrainRequest {
    pub fn new(data_dir: impl Into<PathBuf>, models_dir: impl Into<PathBuf>, model_type: ModelType) -> Self {
        Self {
            data_dir: data_dir.into(),
            models_dir: models_dir.into(),
            model_type,
            feature_type: FeatureType::Mfcc,
            cross_validation: None,
            tuning: None,
        }
    }
}

/// Structured result of a training run; replaces stdout scraping.
#[derive(Debug, Clone, Serialize)]
pub struct TrainReport {
    pub model_path: PathBuf,
    pub num_samples: usize,
    pub num_train: usize,
    pub num_test: usize,
    pub metadata: ModelMetadata,
    /// Non-fatal conditions surfaced to the caller (e.g. skipped tuning).
    pub warnings: Vec<String>,
}

/// Runs the full training pipeline and persists the result.
///
/// Dataset assembly -> stratified 80/20 split -> optional CV -> optional
/// hyperparameter search -> fit -> evaluation -> persist model + metadata
/// + speaker labels. Nothing is written unless every prior stage succeeds.
pub fn train(request: &TrainRequest) -> Result<TrainReport, EngineError> {
    let mut warnings = Vec::new();

    // Training features are MFCC-only; mel is a diagnostics surface.
    let feature_type = match request.feature_type {
        FeatureType::Mfcc => FeatureType::Mfcc,
        FeatureType::Mel => {
            warnings.push("feature type \"mel\" is not supported for training, using \"mfcc\"".to_string());
            FeatureType::Mfcc
        }
    };

    let cfg = FeatureConfig::default();
    let dataset = build_dataset(&request.data_dir, &cfg)?;
    let n_classes = dataset.classes.len();
    let feature_dim = dataset.features.n_cols();
    info!(
        samples = dataset.features.n_rows(),
        feature_dim,
        speakers = n_classes,
        model = %request.model_type,
        "dataset assembled"
    );

    let (x_train, y_train, x_test, y_test) = train_test_split_stratified(
        &dataset.features,
        &dataset.labels,
        n_classes,
        TEST_SIZE,
        TRAIN_SEED,
    )?;

    // Cross-validation on the training split only; reported, never refit.
    let cross_validation = match request.cross_validation {
        Some(folds) => {
            let kfold = StratifiedKFold::new(folds).with_seed(TRAIN_SEED);
            let cv = cross_validate(
                &ModelParams::defaults(request.model_type),
                &x_train,
                &y_train,
                n_classes,
                &kfold,
            )?;
            info!(mean = cv.mean(), std = cv.std(), folds = cv.folds, "cross-validation done");
            Some(CrossValidationMeta {
                cv_mean: cv.mean(),
                cv_std: cv.std(),
                cv_folds: cv.folds,
                cv_scores: cv.scores,
            })
        }
        None => None,
    };

    // Hyperparameter search refits on the best found configuration.
    let mut params = ModelParams::defaults(request.model_type);
    let mut tuning_method = None;
    let mut best_hyperparameters = None;
    if let Some(tuning) = &request.tuning {
        let folds = request.cross_validation.unwrap_or(5).min(5).max(2);
        let kfold = StratifiedKFold::new(folds).with_seed(TRAIN_SEED);
        let method = match tuning.method {
            TuningMethod::Grid => SearchMethod::Grid,
            TuningMethod::Random => SearchMethod::Random {
                n_iter: tuning.n_iter,
            },
        };
        match hyperparameter_search(
            request.model_type,
            &x_train,
            &y_train,
            n_classes,
            method,
            &kfold,
            TRAIN_SEED,
        )? {
            Some(outcome) => {
                info!(
                    score = outcome.best_score,
                    evaluated = outcome.evaluated,
                    "hyperparameter search done"
                );
                best_hyperparameters = serde_json::to_value(&outcome.best_params).ok();
                tuning_method = Some(
                    match tuning.method {
                        TuningMethod::Grid => "grid",
                        TuningMethod::Random => "random",
                    }
                    .to_string(),
                );
                params = outcome.best_params;
            }
            None => {
                let msg = format!(
                    "no hyperparameter grid defined for {}, skipping tuning",
                    request.model_type
                );
                warn!("{msg}");
                warnings.push(msg);
            }
        }
    }

    let mut classifier = Classifier::build(&params);
    classifier.fit(&x_train, &y_train, n_classes)?;

    let train_pred = classifier.predict(&x_train)?;
    let test_pred = classifier.predict(&x_test)?;

    let metadata = ModelMetadata {
        model_type: request.model_type,
        feature_type: feature_type.as_str().to_string(),
        feature_dim,
        num_speakers: n_classes,
        train_accuracy: accuracy(&y_train, &train_pred),
        test_accuracy: accuracy(&y_test, &test_pred),
        precision_macro: precision(&y_test, &test_pred, n_classes, Average::Macro),
        recall_macro: recall(&y_test, &test_pred, n_classes, Average::Macro),
        f1_macro: f1_score(&y_test, &test_pred, n_classes, Average::Macro),
        precision_weighted: precision(&y_test, &test_pred, n_classes, Average::Weighted),
        recall_weighted: recall(&y_test, &test_pred, n_classes, Average::Weighted),
        f1_weighted: f1_score(&y_test, &test_pred, n_classes, Average::Weighted),
        confusion_matrix: confusion_matrix(&y_test, &test_pred, n_classes),
        speakers: dataset.classes.clone(),
        cross_validation,
        best_hyperparameters,
        hyperparameter_tuning_method: tuning_method,
    };
    info!(
        train_accuracy = metadata.train_accuracy,
        test_accuracy = metadata.test_accuracy,
        "model evaluated"
    );

    persist(request, &dataset.classes, classifier, &metadata)?;
    let model_path = request.models_dir.join(model_filename(request.model_type));

    Ok(TrainReport {
        model_path,
        num_samples: dataset.features.n_rows(),
        num_train: y_train.len(),
        num_test: y_test.len(),
        metadata,
        warnings,
    })
}

fn persist(
    request: &TrainRequest,
    classes: &[String],
    classifier: Classifier,
    metadata: &ModelMetadata,
) -> Result<(), EngineError> {
    std::fs::create_dir_all(&request.models_dir)?;
    let model_path = request.models_dir.join(model_filename(request.model_type));

    let model = TrainedModel {
        model_type: request.model_type,
        classes: classes.to_vec(),
        classifier,
    };
    save_model(&model_path, &model)?;
    save_metadata(&model_path, metadata)?;
    save_speaker_labels(&request.models_dir, classes)?;
    info!(path = %model_path.display(), "model persisted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_tone(path: &Path, freq: f64) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..16_000 {
            let t = i as f64 / 16_000.0;
            let s = ((freq * 2.0 * std::f64::consts::PI * t).sin() * 12_000.0) as i16;
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn speaker_dir(root: &Path, name: &str, freq: f64, files: usize) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        for i in 0..files {
            write_tone(&dir.join(format!("utt_{i:04}.wav")), freq + i as f64 * 10.0);
        }
    }

    #[test]
    fn single_speaker_aborts_before_writing_anything() {
        let data = tempfile::tempdir().unwrap();
        let models = tempfile::tempdir().unwrap();
        speaker_dir(data.path(), "alice", 300.0, 3);

        let request = TrainRequest::new(data.path(), models.path(), ModelType::AdaBoost);
        assert!(matches!(
            train(&request),
            Err(EngineError::InsufficientData(_))
        ));
        assert_eq!(std::fs::read_dir(models.path()).unwrap().count(), 0);
    }

    #[test]
    fn mel_feature_request_is_coerced_with_warning() {
        let data = tempfile::tempdir().unwrap();
        let models = tempfile::tempdir().unwrap();
        speaker_dir(data.path(), "alice", 220.0, 5);
        speaker_dir(data.path(), "bob", 1200.0, 5);

        let mut request = TrainRequest::new(data.path(), models.path(), ModelType::AdaBoost);
        request.feature_type = FeatureType::Mel;

        let report = train(&request).unwrap();
        assert_eq!(report.metadata.feature_type, "mfcc");
        assert!(!report.warnings.is_empty());
    }
}
