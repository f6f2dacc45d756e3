//! Classical machine-learning building blocks for speaker identification.
//!
//! Four classifier families behind one tagged [`Classifier`] enum:
//!
//! - [`SvmClassifier`]: RBF-kernel one-vs-rest margin classifier
//! - [`RandomForestClassifier`]: bagged gini decision trees
//! - [`MlpClassifier`]: two-hidden-layer perceptron with Adam and early stopping
//! - [`AdaBoostClassifier`]: SAMME-boosted decision stumps
//!
//! All classifiers work on a row-major [`Matrix`] of f32 features and
//! `usize` class indices in `0..n_classes`; mapping class indices to speaker
//! names is the caller's concern. Every stochastic step is seeded, so a
//! fixed seed reproduces the fitted model bit-for-bit.
//!
//! [`model_selection`] provides stratified train/test splitting, stratified
//! k-fold cross-validation, and grid/randomized hyperparameter search;
//! [`metrics`] the usual accuracy / precision / recall / F1 / confusion
//! matrix set.

mod adaboost;
mod classifier;
mod error;
mod forest;
mod matrix;
pub mod metrics;
pub mod model_selection;
mod mlp;
mod svm;

pub use adaboost::{AdaBoostClassifier, AdaBoostParams};
pub use classifier::{Classifier, ModelParams, ModelType, param_grid};
pub use error::MlError;
pub use forest::{RandomForestClassifier, RandomForestParams};
pub use matrix::Matrix;
pub use mlp::{MlpClassifier, MlpParams};
pub use svm::{Gamma, SvmClassifier, SvmParams};
