//! Descriptor command
//!
//! Print the extension descriptor a build would use, as JSON

use anyhow::{Context, Result};
use kompile_python::{BuildPipeline, Config, DiscoveredPaths, SettingsOverrides};
use std::path::Path;

/// Print the descriptor for the package tree at `source_dir`.
///
/// Fails the same way a build does when `LIB_OUTPUT_PATH` or `INCLUDE_PATH`
/// is missing. Nothing is written to disk.
pub(crate) fn run(source_dir: &Path, overrides: &SettingsOverrides) -> Result<()> {
    let paths = DiscoveredPaths::discover()?;

    let config = Config::load(source_dir).context("Failed to load config")?;
    let pipeline = BuildPipeline::new(config.resolve(source_dir, overrides));
    let descriptor = pipeline.describe(&paths)?;

    let json = descriptor
        .to_json()
        .context("Failed to serialize descriptor")?;
    println!("{json}");

    Ok(())
}
