use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use voxid_ml::{Classifier, ModelType};

use crate::error::StoreError;
use crate::metadata::ModelMetadata;

/// File holding one enrolled speaker label per line.
pub const SPEAKER_LABELS_FILE: &str = "speaker_labels.txt";

/// A fitted classifier together with the speaker labels it was trained
/// over. `classes[i]` names class index `i`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub model_type: ModelType,
    pub classes: Vec<String>,
    pub classifier: Classifier,
}

/// Canonical model filename for a model family.
pub fn model_filename(model_type: ModelType) -> String {
    format!("{}_speaker_model.bin", model_type.as_str())
}

/// Sidecar path for a model file: `<file>.meta`.
pub fn metadata_path(model_path: &Path) -> PathBuf {
    let mut name = model_path.as_os_str().to_os_string();
    name.push(".meta");
    PathBuf::from(name)
}

/// Serializes a trained model to MessagePack.
pub fn save_model(path: &Path, model: &TrainedModel) -> Result<(), StoreError> {
    let bytes = rmp_serde::to_vec_named(model).map_err(|e| StoreError::Serialize {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    fs::write(path, bytes).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(path = %path.display(), "saved model");
    Ok(())
}

/// Deserializes a trained model; absence is a [`StoreError::NotFound`].
pub fn load_model(path: &Path) -> Result<TrainedModel, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = fs::read(path).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    rmp_serde::from_slice(&bytes).map_err(|e| StoreError::Deserialize {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Writes the JSON metadata sidecar.
pub fn save_metadata(model_path: &Path, metadata: &ModelMetadata) -> Result<(), StoreError> {
    let path = metadata_path(model_path);
    let json = serde_json::to_string_pretty(metadata).map_err(|e| StoreError::Serialize {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    fs::write(&path, json).map_err(|e| StoreError::Io {
        path,
        source: e,
    })
}

/// Reads the JSON metadata sidecar for a model file.
pub fn load_metadata(model_path: &Path) -> Result<ModelMetadata, StoreError> {
    let path = metadata_path(model_path);
    if !path.exists() {
        return Err(StoreError::NotFound { path });
    }
    let json = fs::read_to_string(&path).map_err(|e| StoreError::Io {
        path: path.clone(),
        source: e,
    })?;
    serde_json::from_str(&json).map_err(|e| StoreError::Deserialize {
        path,
        reason: e.to_string(),
    })
}

/// Overwrites the speaker labels file, one label per line.
pub fn save_speaker_labels(models_dir: &Path, speakers: &[String]) -> Result<(), StoreError> {
    let path = models_dir.join(SPEAKER_LABELS_FILE);
    fs::write(&path, speakers.join("\n")).map_err(|e| StoreError::Io {
        path,
        source: e,
    })
}

/// Reads the speaker labels file; absence yields an empty list.
pub fn load_speaker_labels(models_dir: &Path) -> Result<Vec<String>, StoreError> {
    let path = models_dir.join(SPEAKER_LABELS_FILE);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(&path).map_err(|e| StoreError::Io {
        path,
        source: e,
    })?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxid_ml::{Matrix, ModelType};

    fn fitted_model() -> TrainedModel {
        let x = Matrix::from_rows(&[
            vec![0.0, 0.0],
            vec![0.1, 0.2],
            vec![5.0, 5.0],
            vec![5.1, 4.9],
        ])
        .unwrap();
        let y = vec![0, 0, 1, 1];
        let mut classifier = Classifier::with_defaults(ModelType::AdaBoost);
        classifier.fit(&x, &y, 2).unwrap();
        TrainedModel {
            model_type: ModelType::AdaBoost,
            classes: vec!["alice".into(), "bob".into()],
            classifier,
        }
    }

    #[test]
    fn model_round_trips_through_messagepack() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(model_filename(ModelType::AdaBoost));

        let model = fitted_model();
        save_model(&path, &model).unwrap();
        let loaded = load_model(&path).unwrap();

        assert_eq!(loaded.model_type, ModelType::AdaBoost);
        assert_eq!(loaded.classes, model.classes);

        // The restored classifier predicts identically.
        let x = Matrix::from_rows(&[vec![0.05, 0.1], vec![5.05, 4.95]]).unwrap();
        assert_eq!(
            loaded.classifier.predict_proba(&x).unwrap(),
            model.classifier.predict_proba(&x).unwrap()
        );
    }

    #[test]
    fn load_missing_model_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.bin");
        assert!(matches!(
            load_model(&path),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn metadata_sidecar_naming() {
        let p = metadata_path(Path::new("models/svm_speaker_model.bin"));
        assert_eq!(p, Path::new("models/svm_speaker_model.bin.meta"));
    }

    #[test]
    fn speaker_labels_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let speakers = vec!["alice".to_string(), "bob".to_string()];
        save_speaker_labels(dir.path(), &speakers).unwrap();

        let raw = fs::read_to_string(dir.path().join(SPEAKER_LABELS_FILE)).unwrap();
        assert_eq!(raw, "alice\nbob");
        assert_eq!(load_speaker_labels(dir.path()).unwrap(), speakers);
    }

    #[test]
    fn missing_labels_file_is_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_speaker_labels(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn model_filenames_are_per_type() {
        assert_eq!(model_filename(ModelType::Svm), "svm_speaker_model.bin");
        assert_eq!(
            model_filename(ModelType::RandomForest),
            "random_forest_speaker_model.bin"
        );
    }
}
