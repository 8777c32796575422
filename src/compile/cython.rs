//! Cython translation
//!
//! Converts the bridging `.pyx` source into C with language level 3 and
//! embedded signatures, the same directives every build of the interface
//! has used.

use super::tool::ToolRunner;
use super::types::CompileError;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Default translator when neither `--cython`, `CYTHON` nor the config file
/// names one.
pub const DEFAULT_CYTHON: &str = "cython";

/// Language level passed as `-3`
pub const LANGUAGE_LEVEL: u8 = 3;

/// Compiler directives passed with `--directive`
pub const DIRECTIVES: &[(&str, &str)] = &[("embedsignature", "True")];

/// Cython translator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CythonTranslator {
    /// Path or name of the `cython` executable
    program: PathBuf,
}

impl CythonTranslator {
    /// Translator using `program`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Executable this translator runs
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The command translating `source` into `output`.
    ///
    /// `search_dir` is added to Cython's include path so `cimport`s of
    /// sibling `.pxd` files resolve.
    #[must_use]
    pub fn command(&self, source: &Path, output: &Path, search_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(format!("-{LANGUAGE_LEVEL}"));
        for (name, value) in DIRECTIVES {
            cmd.arg("--directive").arg(format!("{name}={value}"));
        }
        cmd.arg("-I").arg(search_dir);
        cmd.arg("-o").arg(output);
        cmd.arg(source);
        cmd
    }

    /// Translate `source` into `output`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is missing or Cython fails.
    pub fn translate(
        &self,
        runner: &ToolRunner<'_>,
        source: &Path,
        output: &Path,
        search_dir: &Path,
    ) -> Result<String, CompileError> {
        if !source.is_file() {
            return Err(CompileError::MissingSource {
                path: source.to_path_buf(),
            });
        }

        let cmd = self.command(source, output, search_dir);
        runner.run("cython", cmd)
    }
}

impl Default for CythonTranslator {
    fn default() -> Self {
        Self::new(DEFAULT_CYTHON)
    }
}
