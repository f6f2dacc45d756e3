use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use voxid_engine::{TrainRequest, TuningMethod, TuningRequest, train};
use voxid_features::FeatureType;
use voxid_ml::ModelType;

#[derive(clap::Args, Debug)]
pub struct Args {
    /// Directory of per-speaker sample subdirectories.
    #[arg(long, default_value = "data/raw")]
    data_dir: PathBuf,

    /// Directory receiving the model, metadata, and labels files.
    #[arg(long, default_value = "models")]
    models_dir: PathBuf,

    /// Model type: svm, random_forest, neural_network, adaboost.
    #[arg(short, long, default_value = "svm")]
    model: String,

    /// Feature type (training supports mfcc only).
    #[arg(long, default_value = "mfcc")]
    feature: String,

    /// Run stratified k-fold cross-validation on the training split.
    #[arg(long)]
    cv: bool,

    /// Cross-validation fold count.
    #[arg(long, default_value_t = 5)]
    cv_folds: usize,

    /// Run hyperparameter search before the final fit.
    #[arg(long)]
    tune: bool,

    /// Tuning method: grid or random.
    #[arg(long, default_value = "grid")]
    tuning_method: String,

    /// Candidate budget for randomized search.
    #[arg(long, default_value_t = 20)]
    n_iter: usize,

    /// Emit the full training report as JSON on stdout.
    #[arg(long)]
    json: bool,
}

pub fn run(args: Args) -> Result<()> {
    let model_type: ModelType = args.model.parse().context("invalid --model")?;
    let feature_type: FeatureType = args.feature.parse().context("invalid --feature")?;
    let tuning = if args.tune {
        let method = match args.tuning_method.as_str() {
            "grid" => TuningMethod::Grid,
            "random" => TuningMethod::Random,
            other => bail!("invalid --tuning-method {other:?} (expected grid or random)"),
        };
        Some(TuningRequest {
            method,
            n_iter: args.n_iter,
        })
    } else {
        None
    };

    let request = TrainRequest {
        data_dir: args.data_dir,
        models_dir: args.models_dir,
        model_type,
        feature_type,
        cross_validation: args.cv.then_some(args.cv_folds),
        tuning,
    };

    let report = train(&request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let meta = &report.metadata;
    println!("model:          {}", meta.model_type);
    println!("samples:        {} ({} train / {} test)", report.num_samples, report.num_train, report.num_test);
    println!("speakers:       {} ({})", meta.num_speakers, meta.speakers.join(", "));
    println!("feature dim:    {}", meta.feature_dim);
    println!("train accuracy: {:.4}", meta.train_accuracy);
    println!("test accuracy:  {:.4}", meta.test_accuracy);
    println!("f1 (macro):     {:.4}", meta.f1_macro);
    if let Some(cv) = &meta.cross_validation {
        println!(
            "cv accuracy:    {:.4} +/- {:.4} ({} folds)",
            cv.cv_mean, cv.cv_std, cv.cv_folds
        );
    }
    if let Some(params) = &meta.best_hyperparameters {
        println!("best params:    {params}");
    }
    for warning in &report.warnings {
        println!("warning:        {warning}");
    }
    println!("saved:          {}", report.model_path.display());
    Ok(())
}
