use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use voxid_audio::TARGET_DURATION_MS;
use voxid_features::{FeatureConfig, extract_mfcc, flatten};
use voxid_ml::Matrix;

use crate::error::EngineError;

/// Audio file extensions the dataset builder picks up.
pub const AUDIO_EXTENSIONS: [&str; 5] = ["wav", "mp3", "m4a", "webm", "ogg"];

/// A labeled feature dataset ready for training.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// One flattened MFCC vector per row.
    pub features: Matrix,
    /// Class index per row, into `classes`.
    pub labels: Vec<usize>,
    /// Sorted distinct speaker names; index is the class index.
    pub classes: Vec<String>,
}

/// Walks `root` and assembles the training dataset.
///
/// Every immediate subdirectory is one speaker; every audio file in it
/// (by extension) becomes one sample via load -> normalize -> MFCC ->
/// flatten. Files that fail to decode or extract are logged and skipped.
///
/// Fails with [`EngineError::InsufficientData`] when the directory is
/// missing, holds no speaker subdirectories, yields zero samples, or
/// yields fewer than two distinct speakers.
pub fn build_dataset(root: &Path, cfg: &FeatureConfig) -> Result<Dataset, EngineError> {
    if !root.is_dir() {
        return Err(EngineError::InsufficientData(format!(
            "data directory not found: {}",
            root.display()
        )));
    }

    let mut speaker_dirs: Vec<_> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    speaker_dirs.sort();

    if speaker_dirs.is_empty() {
        return Err(EngineError::InsufficientData(format!(
            "no speaker subdirectories in {}",
            root.display()
        )));
    }

    // Per-speaker sample vectors, keyed by (sorted) speaker name.
    let mut by_speaker: BTreeMap<String, Vec<Vec<f32>>> = BTreeMap::new();

    for dir in &speaker_dirs {
        let Some(speaker) = dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let mut files: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| {
                        AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
                    })
            })
            .collect();
        files.sort();

        if files.is_empty() {
            warn!(speaker, "no audio files, skipping speaker");
            continue;
        }

        let samples = by_speaker.entry(speaker.to_string()).or_default();
        for file in &files {
            match sample_from_file(file, cfg) {
                Ok(vector) => samples.push(vector),
                Err(reason) => {
                    warn!(file = %file.display(), %reason, "skipping file");
                }
            }
        }
        info!(speaker, samples = samples.len(), "collected speaker samples");
    }

    by_speaker.retain(|_, samples| !samples.is_empty());

    let total: usize = by_speaker.values().map(Vec::len).sum();
    if total == 0 {
        return Err(EngineError::InsufficientData(
            "no valid audio files found".to_string(),
        ));
    }
    if by_speaker.len() < 2 {
        return Err(EngineError::InsufficientData(format!(
            "need at least 2 speakers, got {}",
            by_speaker.len()
        )));
    }

    let classes: Vec<String> = by_speaker.keys().cloned().collect();
    let mut rows = Vec::with_capacity(total);
    let mut labels = Vec::with_capacity(total);
    for (class, (_, samples)) in by_speaker.into_iter().enumerate() {
        for vector in samples {
            rows.push(vector);
            labels.push(class);
        }
    }

    Ok(Dataset {
        features: Matrix::from_rows(&rows)?,
        labels,
        classes,
    })
}

fn sample_from_file(path: &Path, cfg: &FeatureConfig) -> Result<Vec<f32>, String> {
    let waveform = voxid_audio::load(path).map_err(|e| e.to_string())?;
    let normalized = waveform.normalize(TARGET_DURATION_MS);
    let features = extract_mfcc(&normalized, cfg).map_err(|e| e.to_string())?;
    Ok(flatten(&features))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tone(path: &Path, freq: f64, n: usize) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..n {
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
            write_tone(&dir.join(format!("utt_{i:04}.wav")), freq + i as f64 * 5.0, 16_000);
        }
    }

    #[test]
    fn builds_labeled_dataset() {
        let root = tempfile::tempdir().unwrap();
        speaker_dir(root.path(), "bob", 800.0, 3);
        speaker_dir(root.path(), "alice", 200.0, 3);

        let ds = build_dataset(root.path(), &FeatureConfig::default()).unwrap();
        assert_eq!(ds.classes, vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(ds.features.n_rows(), 6);
        assert_eq!(ds.labels.iter().filter(|&&c| c == 0).count(), 3);
        // All rows share the fixed flattened width.
        assert_eq!(ds.features.n_cols(), ((48_000 - 2048) / 512 + 1) * 13);
    }

    #[test]
    fn missing_root_is_insufficient_data() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("nope");
        assert!(matches!(
            build_dataset(&missing, &FeatureConfig::default()),
            Err(EngineError::InsufficientData(_))
        ));
    }

    #[test]
    fn no_speaker_dirs_is_insufficient_data() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("stray.wav"), b"x").unwrap();
        assert!(matches!(
            build_dataset(root.path(), &FeatureConfig::default()),
            Err(EngineError::InsufficientData(_))
        ));
    }

    #[test]
    fn single_speaker_is_insufficient_data() {
        let root = tempfile::tempdir().unwrap();
        speaker_dir(root.path(), "alice", 300.0, 3);
        let err = build_dataset(root.path(), &FeatureConfig::default()).unwrap_err();
        match err {
            EngineError::InsufficientData(msg) => assert!(msg.contains("2 speakers")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn undecodable_files_are_skipped_not_fatal() {
        let root = tempfile::tempdir().unwrap();
        speaker_dir(root.path(), "alice", 300.0, 2);
        speaker_dir(root.path(), "bob", 900.0, 2);
        std::fs::write(root.path().join("alice").join("broken.wav"), b"garbage").unwrap();

        let ds = build_dataset(root.path(), &FeatureConfig::default()).unwrap();
        assert_eq!(ds.features.n_rows(), 4);
    }

    #[test]
    fn non_audio_extensions_are_ignored() {
        let root = tempfile::tempdir().unwrap();
        speaker_dir(root.path(), "alice", 300.0, 2);
        speaker_dir(root.path(), "bob", 900.0, 2);
        std::fs::write(root.path().join("alice").join("notes.txt"), b"hello").unwrap();

        let ds = build_dataset(root.path(), &FeatureConfig::default()).unwrap();
        assert_eq!(ds.features.n_rows(), 4);
    }
}
