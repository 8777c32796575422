//! Kompile Python command-line interface
//!
//! Builds the kompile native interface extension and packages it as a wheel

use clap::{Parser, Subcommand};
use kompile_python::{CompileError, DiscoveryError, PipelineError};
use std::path::PathBuf;
use std::process;

/// Display an error with optional backtrace information
fn display_error(err: &anyhow::Error, backtrace_enabled: bool) {
    eprintln!("error: {err}");

    // Show error chain
    let mut source = err.source();
    while let Some(err) = source {
        eprintln!("caused by: {err}");
        source = err.source();
    }

    // Show backtrace if enabled
    if backtrace_enabled {
        let backtrace = err.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            eprintln!("\nBacktrace:");
            eprintln!("{backtrace}");
        }
    }
}

/// Print a failure the way the build reports it and pick the exit status.
///
/// A missing path variable is reported on stdout; a failed build tool ends
/// the process with that tool's own status after its output is shown.
fn report_failure(err: &anyhow::Error, backtrace_enabled: bool) -> i32 {
    let discovery = err.downcast_ref::<DiscoveryError>().or_else(|| {
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::Discovery(e)) => Some(e),
            _ => None,
        }
    });
    if let Some(missing) = discovery {
        println!("{missing}");
        return 1;
    }

    let compile = err.downcast_ref::<CompileError>().or_else(|| {
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::Compile(e)) => Some(e),
            _ => None,
        }
    });
    if let Some(output) = compile.and_then(CompileError::tool_output)
        && !output.trim().is_empty()
    {
        eprint!("{output}");
        if !output.ends_with('\n') {
            eprintln!();
        }
    }

    display_error(err, backtrace_enabled);
    err.downcast_ref::<PipelineError>()
        .map_or_else(|| compile.map_or(1, CompileError::exit_code), PipelineError::exit_code)
}

#[derive(Parser)]
#[command(name = "kompile-python")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Build the kompile native interface extension and package it as a wheel",
    long_about = None
)]
pub(crate) struct Cli {
    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Show a backtrace for errors
    #[arg(long, global = true)]
    backtrace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the extension and write the wheel
    ///
    /// Requires `LIB_OUTPUT_PATH` (directory with the built kompile
    /// libraries) and `INCLUDE_PATH` (their headers) to be set.
    Build {
        /// Root of the Python package tree
        #[arg(long, default_value = ".")]
        source_dir: PathBuf,

        /// Directory for intermediate build products [default: <SOURCE_DIR>/build]
        #[arg(long)]
        build_dir: Option<PathBuf>,

        /// Directory the wheel is written to [default: <SOURCE_DIR>/dist]
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Python interpreter to build for
        #[arg(long)]
        python: Option<String>,

        /// Cython translator
        #[arg(long)]
        cython: Option<String>,

        /// numpy header directory (skips asking the interpreter)
        #[arg(long)]
        numpy_include: Option<PathBuf>,

        /// Show every tool command line and its output
        #[arg(long)]
        verbose: bool,

        /// Suppress all output except errors
        #[arg(long, short, conflicts_with = "verbose")]
        quiet: bool,
    },

    /// Print the extension descriptor as JSON without building
    Descriptor {
        /// Root of the Python package tree
        #[arg(long, default_value = ".")]
        source_dir: PathBuf,

        /// Python interpreter to ask for the numpy header directory
        #[arg(long)]
        python: Option<String>,

        /// numpy header directory (skips asking the interpreter)
        #[arg(long)]
        numpy_include: Option<PathBuf>,
    },

    /// Show the toolchain every build tool runs with
    Toolchain {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that everything a build needs is available
    Doctor {
        /// Root of the Python package tree
        #[arg(long, default_value = ".")]
        source_dir: PathBuf,

        /// Python interpreter to check
        #[arg(long)]
        python: Option<String>,

        /// Cython translator to check
        #[arg(long)]
        cython: Option<String>,

        /// Only report problems
        #[arg(long, short)]
        quiet: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize debug mode
    kompile_python::init_debug(cli.debug);

    let result = match cli.command {
        Commands::Build {
            source_dir,
            build_dir,
            out_dir,
            python,
            cython,
            numpy_include,
            verbose,
            quiet,
        } => commands::build::run(
            &source_dir,
            &kompile_python::SettingsOverrides {
                python,
                cython,
                build_dir,
                out_dir,
                numpy_include,
                verbose,
            },
            quiet,
        ),
        Commands::Descriptor {
            source_dir,
            python,
            numpy_include,
        } => commands::descriptor::run(
            &source_dir,
            &kompile_python::SettingsOverrides {
                python,
                numpy_include,
                ..kompile_python::SettingsOverrides::default()
            },
        ),
        Commands::Toolchain { json } => commands::toolchain::run(json),
        Commands::Doctor {
            source_dir,
            python,
            cython,
            quiet,
        } => commands::doctor::run(&source_dir, python.as_deref(), cython.as_deref(), quiet),
        Commands::Completion { shell } => commands::completion::run(shell),
    };

    if let Err(e) = result {
        let code = report_failure(&e, cli.backtrace);
        process::exit(code);
    }
}

mod commands;
