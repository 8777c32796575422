//! Build command
//!
//! Compile the native interface extension and package it as a wheel

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use kompile_python::{BuildPipeline, Config, SettingsOverrides, Stage};
use std::path::Path;

/// Run the whole build for the package tree at `source_dir`.
pub(crate) fn run(source_dir: &Path, overrides: &SettingsOverrides, quiet: bool) -> Result<()> {
    let config = Config::load(source_dir).context("Failed to load config")?;
    let settings = config.resolve(source_dir, overrides);
    kompile_python::debug!("Build settings: {settings:?}");

    let show_progress = !quiet && !settings.verbose;
    let pipeline = BuildPipeline::new(settings);

    if !quiet {
        println!(
            "Building kompile native interface in {}",
            pipeline.settings().source_dir.display()
        );
    }

    let pb = if show_progress {
        let pb = ProgressBar::new(3);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let result = pipeline.run(&mut |stage| {
        kompile_python::debug!("Reached stage: {stage}");
        match stage {
            Stage::Start => pb.set_message("Probing Python interpreter..."),
            Stage::DescriptorBuilt => {
                pb.inc(1);
                pb.set_message("Compiling extension...");
            }
            Stage::ArtifactReady => {
                pb.inc(1);
                pb.set_message("Packaging wheel...");
            }
            Stage::BundleEmitted => pb.inc(1),
        }
    });

    let report = match result {
        Ok(report) => {
            pb.finish_with_message("Done!");
            report
        }
        Err(e) => {
            pb.abandon_with_message(format!("Failed after {}", e.stage()));
            return Err(e.into());
        }
    };

    if !quiet {
        println!();
        println!("Built {}", report.artifact.path.display());
        if let Some(lib_dir) = report.descriptor.library_dirs.first() {
            println!(
                "Copied {} files from library output path {}",
                report.bundled_libraries,
                lib_dir.display()
            );
        }
        println!(
            "Wrote {} ({} entries)",
            report.wheel.path.display(),
            report.wheel.entries.len()
        );
        println!("Finished in {:.2}s", report.duration.as_secs_f64());
    }

    Ok(())
}
