//! Native library location
//!
//! The prebuilt kompile libraries and their headers are never searched for:
//! the operator names both directories explicitly through `LIB_OUTPUT_PATH`
//! and `INCLUDE_PATH`, and a build without either one stops right here.

use crate::env_vars;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Where the prebuilt native library lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredPaths {
    /// Directory containing the compiled native libraries (link and bundle)
    pub library_output_path: PathBuf,
    /// Directory containing the native headers
    pub include_path: PathBuf,
}

/// A required location was not supplied.
///
/// The messages are shown to the operator as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryError {
    /// `LIB_OUTPUT_PATH` is not set
    #[error(
        "Unable to build. Please specify a library output path with environment variable LIB_OUTPUT_PATH"
    )]
    MissingLibOutputPath,

    /// `INCLUDE_PATH` is not set
    #[error(
        "Unable to build. Please specify an include path with environment variable INCLUDE_PATH"
    )]
    MissingIncludePath,
}

impl DiscoveryError {
    /// Name of the variable that was missing
    #[must_use]
    pub const fn variable(self) -> &'static str {
        match self {
            Self::MissingLibOutputPath => env_vars::LIB_OUTPUT_PATH,
            Self::MissingIncludePath => env_vars::INCLUDE_PATH,
        }
    }
}

impl DiscoveredPaths {
    /// Build from two known directories, bypassing the environment.
    #[must_use]
    pub fn new(library_output_path: impl Into<PathBuf>, include_path: impl Into<PathBuf>) -> Self {
        Self {
            library_output_path: library_output_path.into(),
            include_path: include_path.into(),
        }
    }

    /// Read both locations from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError`] naming the first missing variable.
    /// `LIB_OUTPUT_PATH` is checked before `INCLUDE_PATH`.
    pub fn discover() -> Result<Self, DiscoveryError> {
        Self::from_lookup(env_vars::lookup)
    }

    /// Read both locations through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Same as [`DiscoveredPaths::discover`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DiscoveryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let library_output_path =
            lookup(env_vars::LIB_OUTPUT_PATH).ok_or(DiscoveryError::MissingLibOutputPath)?;
        let include_path =
            lookup(env_vars::INCLUDE_PATH).ok_or(DiscoveryError::MissingIncludePath)?;

        crate::debug!("{} = {library_output_path}", env_vars::LIB_OUTPUT_PATH);
        crate::debug!("{} = {include_path}", env_vars::INCLUDE_PATH);

        Ok(Self::new(library_output_path, include_path))
    }

    /// Directory whose contents are linked against and bundled.
    #[must_use]
    pub fn library_output_path(&self) -> &Path {
        &self.library_output_path
    }

    /// Directory added to the compiler's header search path.
    #[must_use]
    pub fn include_path(&self) -> &Path {
        &self.include_path
    }
}
