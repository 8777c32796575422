//! Configuration file management
//!
//! Reads the optional `kompile-python.toml` from the source directory and the
//! user config from `~/.config/kompile-python/config.toml`, then resolves the
//! final build settings against CLI flags and environment variables.
//!
//! Only tool locations and directories are configurable. The toolchain table
//! and the two required library paths are not.

use crate::compile::DEFAULT_CYTHON;
use crate::python::DEFAULT_PYTHON;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Project config file name, looked up in the source directory
pub const CONFIG_FILE_NAME: &str = "kompile-python.toml";

/// Configuration loaded from TOML files
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// `[build]` table
    #[serde(default)]
    pub build: BuildSection,
}

/// The `[build]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BuildSection {
    /// Python interpreter
    #[serde(default)]
    pub python: Option<String>,

    /// Cython translator
    #[serde(default)]
    pub cython: Option<String>,

    /// Build directory (relative paths are relative to the source directory)
    #[serde(default)]
    pub build_dir: Option<PathBuf>,

    /// Wheel output directory (relative paths are relative to the source directory)
    #[serde(default)]
    pub out_dir: Option<PathBuf>,

    /// numpy header directory; skips asking the interpreter
    #[serde(default)]
    pub numpy_include: Option<PathBuf>,
}

impl Config {
    /// Load configuration for a build rooted at `source_dir`.
    ///
    /// Priority: `<source_dir>/kompile-python.toml` -> user config -> defaults.
    /// Missing files are not an error; unreadable or malformed ones are.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing config file cannot be read or parsed.
    pub fn load(source_dir: &Path) -> Result<Self> {
        let mut config = Self::default();

        if let Some(config_dir) = Self::user_config_dir() {
            let global = config_dir.join("config.toml");
            if global.is_file() {
                config = config.merge(Self::load_from(&global)?);
            }
        }

        let local = source_dir.join(CONFIG_FILE_NAME);
        if local.is_file() {
            config = config.merge(Self::load_from(&local)?);
        }

        Ok(config)
    }

    fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        crate::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn user_config_dir() -> Option<PathBuf> {
        // Check XDG_CONFIG_HOME first
        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg_config).join("kompile-python"));
        }

        // Fall back to ~/.config/kompile-python
        dirs::home_dir().map(|home| home.join(".config").join("kompile-python"))
    }

    /// Values set in `other` win.
    fn merge(mut self, other: Self) -> Self {
        if other.build.python.is_some() {
            self.build.python = other.build.python;
        }
        if other.build.cython.is_some() {
            self.build.cython = other.build.cython;
        }
        if other.build.build_dir.is_some() {
            self.build.build_dir = other.build.build_dir;
        }
        if other.build.out_dir.is_some() {
            self.build.out_dir = other.build.out_dir;
        }
        if other.build.numpy_include.is_some() {
            self.build.numpy_include = other.build.numpy_include;
        }
        self
    }

    /// Resolve final settings.
    ///
    /// Priority per setting: CLI flag -> environment variable -> config
    /// file -> default.
    #[must_use]
    pub fn resolve(&self, source_dir: &Path, overrides: &SettingsOverrides) -> BuildSettings {
        let in_source = |path: &Path| -> PathBuf {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                source_dir.join(path)
            }
        };

        let python = overrides
            .python
            .clone()
            .or_else(crate::env_vars::python)
            .or_else(|| self.build.python.clone())
            .unwrap_or_else(|| DEFAULT_PYTHON.to_string());

        let cython = overrides
            .cython
            .clone()
            .or_else(crate::env_vars::cython)
            .or_else(|| self.build.cython.clone())
            .unwrap_or_else(|| DEFAULT_CYTHON.to_string());

        let build_dir = overrides.build_dir.clone().unwrap_or_else(|| {
            self.build
                .build_dir
                .as_deref()
                .map_or_else(|| source_dir.join("build"), in_source)
        });

        let out_dir = overrides.out_dir.clone().unwrap_or_else(|| {
            self.build
                .out_dir
                .as_deref()
                .map_or_else(|| source_dir.join("dist"), in_source)
        });

        let numpy_include = overrides
            .numpy_include
            .clone()
            .or_else(|| self.build.numpy_include.as_deref().map(in_source));

        BuildSettings {
            source_dir: source_dir.to_path_buf(),
            build_dir,
            out_dir,
            python,
            cython,
            numpy_include,
            verbose: overrides.verbose,
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    /// `--python`
    pub python: Option<String>,
    /// `--cython`
    pub cython: Option<String>,
    /// `--build-dir`
    pub build_dir: Option<PathBuf>,
    /// `--out-dir`
    pub out_dir: Option<PathBuf>,
    /// `--numpy-include`
    pub numpy_include: Option<PathBuf>,
    /// `--verbose`
    pub verbose: bool,
}

/// Fully resolved settings for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    /// Root of the Python package tree
    pub source_dir: PathBuf,
    /// Intermediate build products
    pub build_dir: PathBuf,
    /// Where the wheel is written
    pub out_dir: PathBuf,
    /// Python interpreter
    pub python: String,
    /// Cython translator
    pub cython: String,
    /// numpy header directory, if not asked of the interpreter
    pub numpy_include: Option<PathBuf>,
    /// Echo every tool command line and its output
    pub verbose: bool,
}

impl BuildSettings {
    /// Settings with every default, rooted at `source_dir`.
    #[must_use]
    pub fn with_defaults(source_dir: &Path) -> Self {
        Config::default().resolve(source_dir, &SettingsOverrides::default())
    }
}
