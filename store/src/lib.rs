//! Filesystem model store and in-memory registry.
//!
//! On disk a trained model is three files under one models directory:
//!
//! ```text
//! models/
//!   svm_speaker_model.bin        MessagePack-serialized TrainedModel
//!   svm_speaker_model.bin.meta   JSON ModelMetadata sidecar
//!   speaker_labels.txt           one enrolled speaker per line
//! ```
//!
//! [`Registry`] rebuilds its in-memory state from those files on every
//! construction; it has no persistence of its own. After a retrain the
//! serving layer constructs a fresh registry and swaps it in whole, so
//! readers never observe a half-loaded model set.

mod error;
mod metadata;
mod persist;
mod registry;

pub use error::StoreError;
pub use metadata::{CrossValidationMeta, ModelMetadata};
pub use persist::{
    SPEAKER_LABELS_FILE, TrainedModel, load_metadata, load_model, load_speaker_labels,
    metadata_path, model_filename, save_metadata, save_model, save_speaker_labels,
};
pub use registry::{Registry, RegistryEntry};
