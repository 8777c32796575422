//! Compilation types

use crate::toolchain::ToolchainError;
use std::path::{Path, PathBuf};

/// The built extension module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArtifact {
    /// Dotted module name
    pub module_name: String,
    /// Location of the shared object in the build directory
    pub path: PathBuf,
    /// Filename suffix the module was built with
    pub ext_suffix: String,
}

impl CompiledArtifact {
    /// Path of the module inside a wheel, e.g.
    /// `kompile/interface/native/interface.cpython-39-x86_64-linux-gnu.so`.
    #[must_use]
    pub fn archive_path(&self) -> String {
        format!("{}{}", self.module_name.replace('.', "/"), self.ext_suffix)
    }
}

/// Where intermediate and final build products go.
///
/// ```text
/// <build_dir>/temp/kompile/interface/native/interface.c
/// <build_dir>/temp/kompile/interface/native/interface.o
/// <build_dir>/lib/kompile/interface/native/interface<EXT_SUFFIX>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    /// Root build directory
    pub build_dir: PathBuf,
}

impl BuildLayout {
    /// Layout rooted at `build_dir`.
    #[must_use]
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        Self {
            build_dir: build_dir.into(),
        }
    }

    /// Translated C source
    #[must_use]
    pub fn c_source(&self, module_stem: &Path) -> PathBuf {
        self.build_dir
            .join("temp")
            .join(module_stem)
            .with_extension("c")
    }

    /// Compiled object file
    #[must_use]
    pub fn object(&self, module_stem: &Path) -> PathBuf {
        self.build_dir
            .join("temp")
            .join(module_stem)
            .with_extension("o")
    }

    /// Linked extension module
    #[must_use]
    pub fn module(&self, module_stem: &Path, ext_suffix: &str) -> PathBuf {
        let mut file = self
            .build_dir
            .join("lib")
            .join(module_stem)
            .into_os_string();
        file.push(ext_suffix);
        PathBuf::from(file)
    }
}

/// Errors from translating, compiling or linking.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The bridging source does not exist
    #[error("bridging source not found: {}", .path.display())]
    MissingSource {
        /// Expected location
        path: PathBuf,
    },

    /// A build tool could not be started
    #[error("failed to run {tool}: {source}")]
    Spawn {
        /// Tool that was run
        tool: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A build tool exited unsuccessfully
    #[error("{tool} failed with exit code: {}", .code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    Failed {
        /// Tool that was run
        tool: String,
        /// Exit code, if the tool exited normally
        code: Option<i32>,
        /// Captured stdout and stderr
        output: String,
    },

    /// The toolchain table cannot form a command line
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    /// Build directory could not be prepared
    #[error("failed to create {}: {source}", .path.display())]
    Io {
        /// Directory being created
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl CompileError {
    /// Process exit status for this failure.
    ///
    /// A failing tool's own exit code is passed through; anything else is 1.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Failed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }

    /// Diagnostic output captured from the failing tool, if any.
    #[must_use]
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            Self::Failed { output, .. } if !output.trim().is_empty() => Some(output),
            _ => None,
        }
    }
}
