use std::path::PathBuf;

use anyhow::Result;
use serde_json::json;
use voxid_audio::TARGET_DURATION_MS;
use voxid_engine::predict;
use voxid_features::{FeatureConfig, extract_mfcc};
use voxid_store::Registry;

#[derive(clap::Args, Debug)]
pub struct Args {
    /// Audio file to identify.
    audio: PathBuf,

    /// Model filename to use; defaults to the best loaded model.
    #[arg(short, long)]
    model: Option<String>,

    /// Number of ranked candidates to return.
    #[arg(long, default_value_t = 3)]
    top_k: usize,

    #[arg(long, default_value = "models")]
    models_dir: PathBuf,
}

pub fn run(args: Args) -> Result<()> {
    let waveform = voxid_audio::load(&args.audio)?.normalize(TARGET_DURATION_MS);
    let stats = waveform.stats();
    let features = extract_mfcc(&waveform, &FeatureConfig::default())?;
    let shape = [features.len(), features.first().map_or(0, Vec::len)];

    let registry = Registry::open(&args.models_dir);
    let result = predict(&registry, &features, args.model.as_deref(), args.top_k);

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "file": args.audio,
            "feature_type": "mfcc",
            "audio_stats": stats,
            "features_shape": shape,
            "prediction": result,
        }))?
    );
    Ok(())
}
