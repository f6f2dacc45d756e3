//! Training and inference orchestration.
//!
//! Ties the pipeline together: walk a directory of per-speaker audio
//! samples into a labeled dataset, train one of the four classifier
//! families on it (with optional cross-validation and hyperparameter
//! search), persist the result, and serve ranked top-k predictions from a
//! [`voxid_store::Registry`].

mod dataset;
mod error;
mod predict;
mod train;

pub use dataset::{AUDIO_EXTENSIONS, Dataset, build_dataset};
pub use error::EngineError;
pub use predict::{Prediction, SpeakerPrediction, predict};
pub use train::{TrainReport, TrainRequest, TuningMethod, TuningRequest, train};
