use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

use voxid_features::flatten;
use voxid_ml::Matrix;
use voxid_store::Registry;

/// One ranked speaker candidate.
#[derive(Debug, Clone, Serialize)]
pub struct SpeakerPrediction {
    pub speaker_id: String,
    pub confidence: f64,
    pub speaker_name: String,
}

/// Result of a prediction request.
///
/// `placeholder` marks the no-model demo mode: the entries are fabricated
/// with random confidences and must not be mistaken for real scores.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    pub predictions: Vec<SpeakerPrediction>,
    pub timestamp_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub placeholder: bool,
}

impl Prediction {
    fn failure(error: String) -> Self {
        Self {
            model_used: None,
            predictions: Vec::new(),
            timestamp_ms: now_ms(),
            error: Some(error),
            placeholder: false,
        }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Predicts the top-k speakers for an extracted feature matrix.
///
/// With an empty registry this returns the placeholder result: an error
/// field, `min(top_k, enrolled speakers)` fabricated entries with
/// confidence in [0.7, 0.95], and `placeholder` set — the service stays
/// demoable before any model is trained. With `model_name` omitted, the
/// best model by stored test accuracy is used.
pub fn predict(
    registry: &Registry,
    features: &[Vec<f32>],
    model_name: Option<&str>,
    top_k: usize,
) -> Prediction {
    if registry.is_empty() {
        warn!("no models loaded, producing placeholder predictions");
        return placeholder(registry, top_k);
    }

    let model_name = match model_name {
        Some(name) => name.to_string(),
        None => match registry.best_model() {
            Some(name) => name.to_string(),
            None => return Prediction::failure("no models available".to_string()),
        },
    };

    let Some(entry) = registry.get(&model_name) else {
        return Prediction::failure(format!("model {model_name} not found"));
    };

    // Flatten to the training-time vector shape.
    let vector = flatten(features);
    let n_cols = vector.len();
    let matrix = match Matrix::from_vec(1, n_cols, vector) {
        Ok(m) => m,
        Err(e) => return Prediction::failure(e.to_string()),
    };

    let probabilities = match entry.model.classifier.predict_proba(&matrix) {
        Ok(mut rows) => rows.remove(0),
        Err(e) => return Prediction::failure(e.to_string()),
    };

    // Rank descending; stable sort keeps the model's class order on ties.
    let classes = &entry.model.classes;
    let mut ranked: Vec<(usize, f64)> = probabilities.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let predictions: Vec<SpeakerPrediction> = ranked
        .into_iter()
        .take(top_k)
        .map(|(class, confidence)| {
            let name = classes
                .get(class)
                .cloned()
                .unwrap_or_else(|| format!("speaker_{class}"));
            SpeakerPrediction {
                speaker_id: name.clone(),
                confidence,
                speaker_name: name,
            }
        })
        .collect();

    debug!(model = %model_name, candidates = predictions.len(), "prediction done");
    Prediction {
        model_used: Some(model_name),
        predictions,
        timestamp_ms: now_ms(),
        error: None,
        placeholder: false,
    }
}

fn placeholder(registry: &Registry, top_k: usize) -> Prediction {
    let mut rng = rand::thread_rng();
    let predictions = registry
        .speakers()
        .iter()
        .take(top_k)
        .map(|speaker| SpeakerPrediction {
            speaker_id: speaker.clone(),
            confidence: rng.gen_range(0.7..0.95),
            speaker_name: speaker.clone(),
        })
        .collect();

    Prediction {
        model_used: None,
        predictions,
        timestamp_ms: now_ms(),
        error: Some("no models loaded".to_string()),
        placeholder: true,
    }
}
