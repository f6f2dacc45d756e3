use std::path::PathBuf;

use anyhow::Result;
use serde_json::json;
use voxid_audio::TARGET_DURATION_MS;
use voxid_features::{FeatureConfig, FeatureType, extract};

#[derive(clap::Args, Debug)]
pub struct Args {
    /// Audio file to inspect.
    audio: PathBuf,

    /// Feature type to report the shape of: mfcc or mel.
    #[arg(long, default_value = "mfcc")]
    feature: String,
}

pub fn run(args: Args) -> Result<()> {
    let feature_type: FeatureType = args.feature.parse()?;

    let waveform = voxid_audio::load(&args.audio)?;
    let stats = waveform.stats();

    let normalized = waveform.normalize(TARGET_DURATION_MS);
    let features = extract(&normalized, feature_type, &FeatureConfig::default())?;
    let shape = [features.len(), features.first().map_or(0, Vec::len)];

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "file": args.audio,
            "stats": stats,
            "normalized_duration_ms": TARGET_DURATION_MS,
            "feature_type": feature_type.as_str(),
            "feature_shape": shape,
        }))?
    );
    Ok(())
}
