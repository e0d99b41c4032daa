use fitolab_core::error::FitolabError;
use fitolab_core::model::Sample;
use std::path::Path;

use crate::config::CliConfig;
use crate::output;

pub fn add(config: &CliConfig, file: &Path) -> Result<(), FitolabError> {
    let json_bytes = std::fs::read(file)?;
    let sample: Sample = serde_json::from_slice(&json_bytes)?;
    let id = sample.id;

    let store = config.open_store()?;
    store.put_sample(sample)?;
    println!("Sample {} stored in {}", id, store.path().display());
    Ok(())
}

pub fn list(config: &CliConfig) -> Result<(), FitolabError> {
    let store = config.open_store()?;
    output::table::print_samples(&store.samples()?);
    Ok(())
}
