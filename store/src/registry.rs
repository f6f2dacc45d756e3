use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use voxid_ml::ModelType;

use crate::error::StoreError;
use crate::metadata::ModelMetadata;
use crate::persist::{load_metadata, load_model, load_speaker_labels, model_filename, TrainedModel};

/// One loaded model plus its optional metadata sidecar.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub model: TrainedModel,
    pub metadata: Option<ModelMetadata>,
}

/// In-memory view of the models directory.
///
/// Entries keep insertion order, which makes the best-model tie-break
/// (first seen wins) observable and stable. The registry is a snapshot:
/// after a retrain, build a fresh one with [`Registry::open`] and replace
/// the old value wholesale.
#[derive(Debug)]
pub struct Registry {
    models_dir: PathBuf,
    entries: Vec<(String, RegistryEntry)>,
    speakers: Vec<String>,
}

impl Registry {
    /// Scans `models_dir` for every known model-type filename and loads
    /// what it finds. Per-file failures are logged and skipped; a missing
    /// directory simply yields an empty registry.
    pub fn open(models_dir: &Path) -> Self {
        let mut registry = Self {
            models_dir: models_dir.to_path_buf(),
            entries: Vec::new(),
            speakers: Vec::new(),
        };

        for model_type in ModelType::ALL {
            let filename = model_filename(model_type);
            if !models_dir.join(&filename).exists() {
                continue;
            }
            if let Err(e) = registry.load(&filename) {
                warn!(%filename, error = %e, "skipping model");
            }
        }

        registry.reload_speaker_labels();

        if registry.entries.is_empty() {
            info!(dir = %models_dir.display(), "no trained models found, registry is empty");
        } else {
            info!(count = registry.entries.len(), "loaded models");
        }
        registry
    }

    /// Loads (or replaces) one model by filename. Metadata absence is
    /// tolerated with a warning; model absence is an error.
    pub fn load(&mut self, filename: &str) -> Result<(), StoreError> {
        let path = self.models_dir.join(filename);
        let model = load_model(&path)?;

        let metadata = match load_metadata(&path) {
            Ok(meta) => Some(meta),
            Err(StoreError::NotFound { .. }) => {
                warn!(%filename, "no metadata sidecar, model will rank last");
                None
            }
            Err(e) => {
                warn!(%filename, error = %e, "unreadable metadata sidecar, ignoring");
                None
            }
        };

        let entry = RegistryEntry { model, metadata };
        match self.entries.iter_mut().find(|(name, _)| name == filename) {
            Some((_, slot)) => *slot = entry,
            None => self.entries.push((filename.to_string(), entry)),
        }
        debug!(%filename, "model loaded into registry");
        Ok(())
    }

    /// Re-reads the speaker labels file; absence yields an empty list.
    pub fn reload_speaker_labels(&mut self) {
        self.speakers = match load_speaker_labels(&self.models_dir) {
            Ok(labels) => labels,
            Err(e) => {
                warn!(error = %e, "failed to read speaker labels");
                Vec::new()
            }
        };
    }

    /// Removes an entry; no-op when absent.
    pub fn unload(&mut self, filename: &str) {
        self.entries.retain(|(name, _)| name != filename);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Loaded model filenames in insertion order.
    pub fn models(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn get(&self, filename: &str) -> Option<&RegistryEntry> {
        self.entries
            .iter()
            .find(|(name, _)| name == filename)
            .map(|(_, entry)| entry)
    }

    pub fn metadata(&self, filename: &str) -> Option<&ModelMetadata> {
        self.get(filename).and_then(|e| e.metadata.as_ref())
    }

    /// Enrolled speaker labels, used only for placeholder predictions.
    pub fn speakers(&self) -> &[String] {
        &self.speakers
    }

    /// The filename with the highest metadata `test_accuracy`. Entries
    /// without metadata rank as 0.0; ties keep the first-inserted entry;
    /// an empty registry yields `None`.
    pub fn best_model(&self) -> Option<&str> {
        let mut best: Option<(&str, f64)> = None;
        for (name, entry) in &self.entries {
            let accuracy = entry
                .metadata
                .as_ref()
                .map(|m| m.test_accuracy)
                .unwrap_or(0.0);
            if best.is_none_or(|(_, acc)| accuracy > acc) {
                best = Some((name, accuracy));
            }
        }
        best.map(|(name, _)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{save_metadata, save_model};
    use voxid_ml::{Classifier, Matrix};

    fn trained(model_type: ModelType) -> TrainedModel {
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
            model_type,
            classes: vec!["alice".into(), "bob".into()],
            classifier,
        }
    }

    fn metadata(model_type: ModelType, test_accuracy: f64) -> ModelMetadata {
        ModelMetadata {
            model_type,
            feature_type: "mfcc".into(),
            feature_dim: 2,
            num_speakers: 2,
            train_accuracy: 1.0,
            test_accuracy,
            precision_macro: 1.0,
            recall_macro: 1.0,
            f1_macro: 1.0,
            precision_weighted: 1.0,
            recall_weighted: 1.0,
            f1_weighted: 1.0,
            confusion_matrix: vec![vec![1, 0], vec![0, 1]],
            speakers: vec!["alice".into(), "bob".into()],
            cross_validation: None,
            best_hyperparameters: None,
            hyperparameter_tuning_method: None,
        }
    }

    fn persist(dir: &Path, model_type: ModelType, accuracy: Option<f64>) {
        let path = dir.join(model_filename(model_type));
        save_model(&path, &trained(model_type)).unwrap();
        if let Some(acc) = accuracy {
            save_metadata(&path, &metadata(model_type, acc)).unwrap();
        }
    }

    #[test]
    fn best_model_picks_highest_accuracy() {
        let dir = tempfile::tempdir().unwrap();
        persist(dir.path(), ModelType::Svm, Some(0.70));
        persist(dir.path(), ModelType::RandomForest, Some(0.95));
        persist(dir.path(), ModelType::AdaBoost, Some(0.82));

        let registry = Registry::open(dir.path());
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.best_model(),
            Some("random_forest_speaker_model.bin")
        );
    }

    #[test]
    fn best_model_without_metadata_is_first_loaded() {
        let dir = tempfile::tempdir().unwrap();
        persist(dir.path(), ModelType::Svm, None);
        persist(dir.path(), ModelType::AdaBoost, None);

        let registry = Registry::open(dir.path());
        // Scan order follows ModelType::ALL: svm is inserted first.
        assert_eq!(registry.best_model(), Some("svm_speaker_model.bin"));
    }

    #[test]
    fn best_model_of_empty_registry_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::open(dir.path());
        assert!(registry.is_empty());
        assert_eq!(registry.best_model(), None);
    }

    #[test]
    fn metadata_round_trip_preserves_ranking_accuracy() {
        let dir = tempfile::tempdir().unwrap();
        persist(dir.path(), ModelType::Svm, Some(0.8125));

        let registry = Registry::open(dir.path());
        let meta = registry.metadata("svm_speaker_model.bin").unwrap();
        assert!((meta.test_accuracy - 0.8125).abs() < 1e-12);
    }

    #[test]
    fn missing_metadata_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        persist(dir.path(), ModelType::Svm, None);

        let registry = Registry::open(dir.path());
        assert_eq!(registry.len(), 1);
        assert!(registry.metadata("svm_speaker_model.bin").is_none());
    }

    #[test]
    fn corrupt_model_file_is_skipped_by_scan() {
        let dir = tempfile::tempdir().unwrap();
        persist(dir.path(), ModelType::Svm, Some(0.9));
        std::fs::write(
            dir.path().join(model_filename(ModelType::AdaBoost)),
            b"not messagepack",
        )
        .unwrap();

        let registry = Registry::open(dir.path());
        assert_eq!(registry.models(), vec!["svm_speaker_model.bin"]);
    }

    #[test]
    fn explicit_load_of_missing_model_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::open(dir.path());
        assert!(matches!(
            registry.load("svm_speaker_model.bin"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn unload_removes_entry_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        persist(dir.path(), ModelType::Svm, Some(0.9));

        let mut registry = Registry::open(dir.path());
        registry.unload("svm_speaker_model.bin");
        assert!(registry.is_empty());
        registry.unload("svm_speaker_model.bin");
        assert!(registry.is_empty());
    }

    #[test]
    fn speaker_labels_loaded_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        crate::persist::save_speaker_labels(dir.path(), &["alice".into(), "bob".into()]).unwrap();

        let registry = Registry::open(dir.path());
        assert_eq!(registry.speakers(), ["alice", "bob"]);
    }
}
