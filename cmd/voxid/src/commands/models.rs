use std::path::PathBuf;

use anyhow::Result;
use serde_json::json;
use voxid_store::Registry;

#[derive(clap::Args, Debug)]
pub struct Args {
    #[arg(long, default_value = "models")]
    models_dir: PathBuf,
}

pub fn run(args: Args) -> Result<()> {
    let registry = Registry::open(&args.models_dir);
    let best = registry.best_model().map(str::to_string);

    let models: Vec<_> = registry
        .models()
        .iter()
        .map(|&name| {
            let metadata = registry.metadata(name);
            json!({
                "name": name,
                "model_type": registry.get(name).map(|e| e.model.model_type),
                "metadata": metadata,
                "is_best": Some(name) == best.as_deref(),
            })
        })
        .collect();

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "models": models,
            "best_model": best,
            "speakers": registry.speakers(),
        }))?
    );
    Ok(())
}
