//! Python interpreter probing
//!
//! The extension is built for one specific interpreter. Its header
//! directory, the filename suffix it expects for extension modules, its
//! version and platform (for the wheel tag) and the numpy header directory
//! are all asked of the interpreter itself.

use serde::Deserialize;
use std::path::PathBuf;
use std::process::Command;

/// Default interpreter when neither `--python`, `PYTHON` nor the config
/// file names one.
pub const DEFAULT_PYTHON: &str = "python3";

/// Script run with `python -c`; prints one JSON object.
const PROBE_SCRIPT: &str = r#"
import json, sys, sysconfig
try:
    import numpy
    numpy_include = numpy.get_include()
except ImportError:
    numpy_include = None
print(json.dumps({
    "executable": sys.executable,
    "version": [sys.version_info[0], sys.version_info[1]],
    "include": sysconfig.get_paths()["include"],
    "ext_suffix": sysconfig.get_config_var("EXT_SUFFIX") or ".so",
    "platform": sysconfig.get_platform(),
    "numpy_include": numpy_include,
}))
"#;

/// Facts about the target interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PythonEnvironment {
    /// Absolute path of the interpreter
    pub executable: PathBuf,
    /// `(major, minor)`
    pub version: (u32, u32),
    /// Directory containing `Python.h`
    pub include: PathBuf,
    /// Extension module suffix, e.g. `.cpython-39-x86_64-linux-gnu.so`
    pub ext_suffix: String,
    /// `sysconfig.get_platform()`, e.g. `linux-x86_64`
    pub platform: String,
    /// numpy header directory, if numpy is importable
    pub numpy_include: Option<PathBuf>,
}

/// Errors from running or understanding the interpreter probe.
#[derive(Debug, thiserror::Error)]
pub enum PythonError {
    /// The interpreter could not be started
    #[error("failed to run Python interpreter `{python}`: {source}")]
    Spawn {
        /// Interpreter that was run
        python: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The probe exited unsuccessfully
    #[error("Python interpreter `{python}` failed to report its configuration:\n{stderr}")]
    ProbeFailed {
        /// Interpreter that was run
        python: String,
        /// Captured stderr
        stderr: String,
    },

    /// The probe printed something that is not the expected JSON
    #[error("unexpected output from Python interpreter `{python}`: {source}")]
    Parse {
        /// Interpreter that was run
        python: String,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// numpy is not importable and no header directory was given
    #[error("NumPy is not importable by `{python}`. Install numpy or pass --numpy-include <DIR>")]
    NumpyMissing {
        /// Interpreter that was run
        python: String,
    },
}

impl PythonEnvironment {
    /// Run the probe script with `python`.
    ///
    /// # Errors
    ///
    /// Returns an error if the interpreter cannot be started, exits
    /// unsuccessfully, or prints unexpected output.
    pub fn probe(python: &str) -> Result<Self, PythonError> {
        crate::debug!("Probing Python interpreter: {python}");

        let output = Command::new(python)
            .arg("-c")
            .arg(PROBE_SCRIPT)
            .output()
            .map_err(|source| PythonError::Spawn {
                python: python.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(PythonError::ProbeFailed {
                python: python.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let env = Self::parse(python, &String::from_utf8_lossy(&output.stdout))?;
        crate::debug!(
            "Python {}.{} at {} ({})",
            env.version.0,
            env.version.1,
            env.executable.display(),
            env.platform
        );
        Ok(env)
    }

    /// Parse the probe's JSON output.
    ///
    /// # Errors
    ///
    /// Returns [`PythonError::Parse`] if the output is not the expected JSON.
    pub fn parse(python: &str, stdout: &str) -> Result<Self, PythonError> {
        serde_json::from_str(stdout.trim()).map_err(|source| PythonError::Parse {
            python: python.to_string(),
            source,
        })
    }

    /// The numpy header directory, or an error naming the interpreter.
    ///
    /// # Errors
    ///
    /// Returns [`PythonError::NumpyMissing`] if numpy was not importable.
    pub fn require_numpy_include(&self) -> Result<PathBuf, PythonError> {
        self.numpy_include
            .clone()
            .ok_or_else(|| PythonError::NumpyMissing {
                python: self.executable.display().to_string(),
            })
    }

    /// Wheel tag for this interpreter.
    #[must_use]
    pub fn wheel_tag(&self) -> WheelTag {
        let interpreter = format!("cp{}{}", self.version.0, self.version.1);
        WheelTag {
            python: interpreter.clone(),
            abi: interpreter,
            platform: self.platform.replace(['-', '.'], "_"),
        }
    }
}

/// `<python>-<abi>-<platform>` triple of a wheel filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelTag {
    /// e.g. `cp39`
    pub python: String,
    /// e.g. `cp39`
    pub abi: String,
    /// e.g. `linux_x86_64`
    pub platform: String,
}

impl std::fmt::Display for WheelTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.python, self.abi, self.platform)
    }
}
