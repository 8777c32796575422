//! Environment variable handling.
//!
//! Every variable the build reads goes through this module. The two path
//! variables are required by the pipeline; the rest only select tools.

use std::env;

/// Directory holding the compiled native libraries to link against and bundle.
pub const LIB_OUTPUT_PATH: &str = "LIB_OUTPUT_PATH";

/// Directory holding the native library headers.
pub const INCLUDE_PATH: &str = "INCLUDE_PATH";

/// Python interpreter used to probe headers, suffixes and numpy.
pub const PYTHON: &str = "PYTHON";

/// Cython translator executable.
pub const CYTHON: &str = "CYTHON";

/// Enables debug logging when set to a truthy value.
pub const KOMPILE_DEBUG: &str = "KOMPILE_DEBUG";

// Helper for boolean environment variables that accept "1", "true", "yes"
fn is_enabled(var: &str) -> bool {
    env::var(var).ok().is_some_and(|s| {
        let s = s.to_lowercase();
        s == "1" || s == "true" || s == "yes"
    })
}

/// Get a variable by name, the way discovery looks them up.
///
/// Presence is what counts: an empty value is returned as `Some("")`.
/// Non-UTF-8 values are converted lossily rather than treated as absent.
pub fn lookup(name: &str) -> Option<String> {
    env::var_os(name).map(|value| value.to_string_lossy().into_owned())
}

/// Get the Python interpreter override (`PYTHON`).
pub fn python() -> Option<String> {
    env::var(PYTHON).ok().filter(|s| !s.is_empty())
}

/// Get the Cython translator override (`CYTHON`).
pub fn cython() -> Option<String> {
    env::var(CYTHON).ok().filter(|s| !s.is_empty())
}

/// Check if debug logging was requested through the environment.
pub fn kompile_debug() -> bool {
    is_enabled(KOMPILE_DEBUG)
}
