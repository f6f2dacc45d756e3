//! End-to-end pipeline test: synthesize two speakers' worth of WAV files,
//! train an SVM, then predict through the registry.

use std::path::Path;

use voxid_audio::TARGET_DURATION_MS;
use voxid_engine::{TrainRequest, predict, train};
use voxid_features::{FeatureConfig, extract_mfcc};
use voxid_ml::ModelType;
use voxid_store::{Registry, SPEAKER_LABELS_FILE};

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

/// Five files per speaker; "alice" is a low voice, "bob" a high one.
fn seed_data(root: &Path) {
    let alice = root.join("alice");
    let bob = root.join("bob");
    std::fs::create_dir_all(&alice).unwrap();
    std::fs::create_dir_all(&bob).unwrap();
    for i in 0..5 {
        write_tone(&alice.join(format!("utt_{i:04}.wav")), 210.0 + i as f64 * 8.0);
        write_tone(&bob.join(format!("utt_{i:04}.wav")), 1150.0 + i as f64 * 8.0);
    }
}

#[test]
fn train_then_predict_round_trip() {
    let data = tempfile::tempdir().unwrap();
    let models = tempfile::tempdir().unwrap();
    seed_data(data.path());

    // Train.
    let request = TrainRequest::new(data.path(), models.path(), ModelType::Svm);
    let report = train(&request).unwrap();

    assert_eq!(report.num_samples, 10);
    assert_eq!(report.num_train + report.num_test, 10);
    assert_eq!(report.metadata.num_speakers, 2);
    assert_eq!(report.metadata.speakers, vec!["alice", "bob"]);
    assert!(report.warnings.is_empty());

    // Persisted layout.
    let model_path = models.path().join("svm_speaker_model.bin");
    assert!(model_path.exists());
    assert!(models.path().join("svm_speaker_model.bin.meta").exists());
    let labels = std::fs::read_to_string(models.path().join(SPEAKER_LABELS_FILE)).unwrap();
    assert_eq!(labels, "alice\nbob");

    // Registry sees the run and ranks by its recorded accuracy.
    let registry = Registry::open(models.path());
    assert_eq!(registry.models(), vec!["svm_speaker_model.bin"]);
    assert_eq!(registry.best_model(), Some("svm_speaker_model.bin"));
    let meta = registry.metadata("svm_speaker_model.bin").unwrap();
    assert!((meta.test_accuracy - report.metadata.test_accuracy).abs() < 1e-12);
    assert_eq!(meta.feature_dim, report.metadata.feature_dim);

    // Tones this clean should classify cleanly.
    assert!(
        report.metadata.test_accuracy >= 0.5,
        "test accuracy {}",
        report.metadata.test_accuracy
    );

    // Predict on a fresh low-pitched clip.
    let probe = data.path().join("probe.wav");
    write_tone(&probe, 225.0);
    let waveform = voxid_audio::load(&probe)
        .unwrap()
        .normalize(TARGET_DURATION_MS);
    let features = extract_mfcc(&waveform, &FeatureConfig::default()).unwrap();

    let result = predict(&registry, &features, None, 2);
    assert!(result.error.is_none(), "error: {:?}", result.error);
    assert!(!result.placeholder);
    assert_eq!(result.model_used.as_deref(), Some("svm_speaker_model.bin"));
    assert_eq!(result.predictions.len(), 2);

    for p in &result.predictions {
        assert!(p.speaker_id == "alice" || p.speaker_id == "bob");
    }
    assert!(result.predictions[0].confidence >= result.predictions[1].confidence);
    let sum: f64 = result.predictions.iter().map(|p| p.confidence).sum();
    assert!(sum <= 1.0 + 1e-9);
}

#[test]
fn retrain_overwrites_model_and_labels() {
    let data = tempfile::tempdir().unwrap();
    let models = tempfile::tempdir().unwrap();
    seed_data(data.path());

    let request = TrainRequest::new(data.path(), models.path(), ModelType::AdaBoost);
    train(&request).unwrap();
    let first = std::fs::metadata(models.path().join("adaboost_speaker_model.bin"))
        .unwrap()
        .len();

    // A third speaker appears; retraining rewrites the same filenames.
    let carol = data.path().join("carol");
    std::fs::create_dir_all(&carol).unwrap();
    for i in 0..5 {
        write_tone(&carol.join(format!("utt_{i:04}.wav")), 600.0 + i as f64 * 8.0);
    }
    let report = train(&request).unwrap();

    assert_eq!(report.metadata.num_speakers, 3);
    let labels = std::fs::read_to_string(models.path().join(SPEAKER_LABELS_FILE)).unwrap();
    assert_eq!(labels, "alice\nbob\ncarol");
    assert!(first > 0);

    let registry = Registry::open(models.path());
    assert_eq!(registry.speakers(), ["alice", "bob", "carol"]);
}

#[test]
fn cross_validation_and_random_tuning_paths() {
    let data = tempfile::tempdir().unwrap();
    let models = tempfile::tempdir().unwrap();
    seed_data(data.path());

    let mut request = TrainRequest::new(data.path(), models.path(), ModelType::AdaBoost);
    request.cross_validation = Some(3);
    request.tuning = Some(voxid_engine::TuningRequest {
        method: voxid_engine::TuningMethod::Random,
        n_iter: 2,
    });

    let report = train(&request).unwrap();
    let cv = report.metadata.cross_validation.as_ref().unwrap();
    assert_eq!(cv.cv_folds, cv.cv_scores.len());
    assert!(cv.cv_mean >= 0.0 && cv.cv_mean <= 1.0);
    assert!(report.metadata.best_hyperparameters.is_some());
    assert_eq!(
        report.metadata.hyperparameter_tuning_method.as_deref(),
        Some("random")
    );
}
