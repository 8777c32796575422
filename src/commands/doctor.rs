//! Doctor command - Diagnose common build problems
//!
//! This command checks for common issues before a build:
//! - Missing or unusable `LIB_OUTPUT_PATH` / `INCLUDE_PATH`
//! - Missing kompile libraries in the library output path
//! - Missing bridging source
//! - Python interpreter or numpy not available
//! - Cython or the compiler not runnable
//! - Invalid config files

use anyhow::Result;
use std::path::Path;
use std::process::Command;

use kompile_python::config::{Config, SettingsOverrides};
use kompile_python::descriptor::{LINK_TARGETS, SOURCE_FILE};
use kompile_python::{DiscoveredPaths, PythonEnvironment, ToolchainConfig};

/// Collects check results and prints them as they come in.
#[derive(Debug, Default)]
struct Diagnosis {
    quiet: bool,
    has_errors: bool,
    has_warnings: bool,
}

impl Diagnosis {
    fn ok(&self, message: &str) {
        if !self.quiet {
            println!("{message}");
        }
    }

    fn warn(&mut self, message: &str) {
        eprintln!("{message}");
        self.has_warnings = true;
    }

    fn error(&mut self, message: &str) {
        eprintln!("{message}");
        self.has_errors = true;
    }
}

/// Run the doctor command to diagnose common problems.
pub(crate) fn run(
    source_dir: &Path,
    python: Option<&str>,
    cython: Option<&str>,
    quiet: bool,
) -> Result<()> {
    if !quiet {
        println!("Checking build environment for common problems...");
        println!();
    }

    let mut diagnosis = Diagnosis {
        quiet,
        ..Diagnosis::default()
    };

    let config = match Config::load(source_dir) {
        Ok(config) => {
            diagnosis.ok("Configuration is valid");
            config
        }
        Err(e) => {
            diagnosis.warn(&format!("Configuration issue: {e:#}"));
            Config::default()
        }
    };
    let settings = config.resolve(
        source_dir,
        &SettingsOverrides {
            python: python.map(str::to_string),
            cython: cython.map(str::to_string),
            ..SettingsOverrides::default()
        },
    );

    check_paths(&mut diagnosis);
    check_source(&mut diagnosis, source_dir);
    check_python(&mut diagnosis, &settings.python, settings.numpy_include.is_some());
    check_tool(&mut diagnosis, "Cython", &settings.cython);
    let toolchain = ToolchainConfig::explicit();
    check_tool(&mut diagnosis, "Compiler", &toolchain.cc);

    println!();
    if diagnosis.has_errors {
        anyhow::bail!("Issues found with the build environment");
    } else if diagnosis.has_warnings {
        println!("Build environment has warnings but is usable");
        Ok(())
    } else {
        println!("No issues found with the build environment");
        Ok(())
    }
}

fn check_paths(diagnosis: &mut Diagnosis) {
    let paths = match DiscoveredPaths::discover() {
        Ok(paths) => paths,
        Err(e) => {
            diagnosis.error(&e.to_string());
            return;
        }
    };

    let lib_dir = paths.library_output_path();
    if lib_dir.is_dir() {
        diagnosis.ok(&format!("Library output path found ({})", lib_dir.display()));
        for target in LINK_TARGETS {
            let prefix = format!("lib{target}.");
            let present = std::fs::read_dir(lib_dir).is_ok_and(|entries| {
                entries
                    .filter_map(Result::ok)
                    .any(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
            });
            if present {
                diagnosis.ok(&format!("Library {target} found"));
            } else {
                diagnosis.warn(&format!(
                    "Library {target} not found in {}",
                    lib_dir.display()
                ));
            }
        }
    } else {
        diagnosis.error(&format!(
            "Library output path is not a directory: {}",
            lib_dir.display()
        ));
    }

    let include_dir = paths.include_path();
    if include_dir.is_dir() {
        diagnosis.ok(&format!("Include path found ({})", include_dir.display()));
    } else {
        diagnosis.error(&format!(
            "Include path is not a directory: {}",
            include_dir.display()
        ));
    }
}

fn check_source(diagnosis: &mut Diagnosis, source_dir: &Path) {
    let source = source_dir.join(SOURCE_FILE);
    if source.is_file() {
        diagnosis.ok(&format!("Bridging source found ({})", source.display()));
    } else {
        diagnosis.error(&format!("Bridging source not found at {}", source.display()));
    }
}

fn check_python(diagnosis: &mut Diagnosis, python: &str, numpy_given: bool) {
    match PythonEnvironment::probe(python) {
        Ok(env) => {
            diagnosis.ok(&format!(
                "Python {}.{} found ({})",
                env.version.0,
                env.version.1,
                env.executable.display()
            ));
            if env.numpy_include.is_some() {
                diagnosis.ok("NumPy headers found");
            } else if numpy_given {
                diagnosis.ok("NumPy headers configured explicitly");
            } else {
                diagnosis.error(&format!("NumPy is not importable by {python}"));
                eprintln!("  Install numpy or set numpy_include in kompile-python.toml");
            }
        }
        Err(e) => diagnosis.error(&e.to_string()),
    }
}

fn check_tool(diagnosis: &mut Diagnosis, label: &str, program: &str) {
    match Command::new(program).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let mut version = String::from_utf8_lossy(&output.stdout).into_owned();
            if version.trim().is_empty() {
                version = String::from_utf8_lossy(&output.stderr).into_owned();
            }
            let first_line = version.lines().next().unwrap_or_default().trim().to_string();
            diagnosis.ok(&format!("{label} found ({program}: {first_line})"));
        }
        Ok(output) => diagnosis.error(&format!(
            "{label} `{program}` exited with {}",
            output.status
        )),
        Err(e) => diagnosis.error(&format!("{label} `{program}` could not be run: {e}")),
    }
}
