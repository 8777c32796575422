//! Extension descriptor
//!
//! Describes the one native module this crate builds: which source to
//! translate, where headers and libraries are found, what to link, and where
//! the dynamic loader should look at run time. The descriptor depends only on
//! the discovered paths and the numpy header directory; the same inputs
//! always produce the same descriptor.

use crate::discovery::DiscoveredPaths;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Dotted module name of the extension
pub const MODULE_NAME: &str = "kompile.interface.native.interface";

/// Bridging source, relative to the source directory
pub const SOURCE_FILE: &str = "kompile/interface/native/interface.pyx";

/// Native libraries the extension links against
pub const LINK_TARGETS: [&str; 2] = ["kompile_c_library", "kompile-image"];

/// Language the translated source is compiled as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// C
    C,
}

/// Where the dynamic loader searches for the extension's dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuntimeSearchPath {
    /// The directory the installed extension itself lives in
    Origin,
}

impl RuntimeSearchPath {
    /// The `-Wl,-rpath,...` linker argument for this search path.
    #[must_use]
    pub fn linker_arg(&self) -> String {
        match self {
            Self::Origin => "-Wl,-rpath,$ORIGIN".to_string(),
        }
    }
}

impl fmt::Display for RuntimeSearchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Origin => f.write_str("$ORIGIN"),
        }
    }
}

/// Everything the compilation driver needs to build the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionDescriptor {
    /// Dotted module name
    pub name: String,
    /// Bridging source file
    pub source: PathBuf,
    /// Header search directories, numpy first
    pub include_dirs: Vec<PathBuf>,
    /// Library search directories used at link time
    pub library_dirs: Vec<PathBuf>,
    /// Libraries linked with `-l`
    pub libraries: Vec<String>,
    /// Runtime library search path
    pub runtime_library_dirs: Vec<RuntimeSearchPath>,
    /// Extra compiler arguments
    pub extra_compile_args: Vec<String>,
    /// Source language
    pub language: Language,
}

impl ExtensionDescriptor {
    /// Build the descriptor for the kompile native interface.
    ///
    /// `source_dir` is the root of the Python package tree; `numpy_include`
    /// is the numpy header directory.
    #[must_use]
    pub fn new(paths: &DiscoveredPaths, numpy_include: &Path, source_dir: &Path) -> Self {
        Self {
            name: MODULE_NAME.to_string(),
            source: source_dir.join(SOURCE_FILE),
            include_dirs: vec![numpy_include.to_path_buf(), paths.include_path.clone()],
            library_dirs: vec![paths.library_output_path.clone()],
            libraries: LINK_TARGETS.iter().map(ToString::to_string).collect(),
            runtime_library_dirs: vec![RuntimeSearchPath::Origin],
            extra_compile_args: Vec::new(),
            language: Language::C,
        }
    }

    /// Module path components, e.g. `["kompile", "interface", "native", "interface"]`.
    pub fn module_components(&self) -> impl Iterator<Item = &str> {
        self.name.split('.')
    }

    /// Path of the built module relative to a package root, without suffix.
    ///
    /// `kompile.interface.native.interface` becomes
    /// `kompile/interface/native/interface`.
    #[must_use]
    pub fn module_stem(&self) -> PathBuf {
        self.module_components().collect()
    }

    /// `-I` arguments for every include directory
    #[must_use]
    pub fn include_args(&self) -> Vec<String> {
        self.include_dirs
            .iter()
            .map(|dir| format!("-I{}", dir.display()))
            .collect()
    }

    /// Linker arguments: library directories, runtime search paths, then
    /// libraries.
    #[must_use]
    pub fn link_args(&self) -> Vec<String> {
        let dirs = self
            .library_dirs
            .iter()
            .map(|dir| format!("-L{}", dir.display()));
        let rpaths = self
            .runtime_library_dirs
            .iter()
            .map(RuntimeSearchPath::linker_arg);
        let libs = self.libraries.iter().map(|lib| format!("-l{lib}"));
        dirs.chain(rpaths).chain(libs).collect()
    }

    /// Stable JSON rendering, used to compare descriptors across builds.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ExtensionDescriptor {
        let paths = DiscoveredPaths::new("/lib", "/inc");
        ExtensionDescriptor::new(&paths, Path::new("/numpy/include"), Path::new("/src"))
    }

    #[test]
    fn include_dirs_are_numpy_then_include_path() {
        let desc = descriptor();
        assert_eq!(
            desc.include_dirs,
            vec![PathBuf::from("/numpy/include"), PathBuf::from("/inc")]
        );
    }

    #[test]
    fn fixed_parts() {
        let desc = descriptor();
        assert_eq!(desc.name, "kompile.interface.native.interface");
        assert_eq!(
            desc.source,
            PathBuf::from("/src/kompile/interface/native/interface.pyx")
        );
        assert_eq!(desc.library_dirs, vec![PathBuf::from("/lib")]);
        assert_eq!(desc.libraries, vec!["kompile_c_library", "kompile-image"]);
        assert_eq!(desc.runtime_library_dirs, vec![RuntimeSearchPath::Origin]);
        assert!(desc.extra_compile_args.is_empty());
        assert_eq!(desc.language, Language::C);
    }

    #[test]
    fn link_args_order() {
        assert_eq!(
            descriptor().link_args(),
            vec![
                "-L/lib",
                "-Wl,-rpath,$ORIGIN",
                "-lkompile_c_library",
                "-lkompile-image",
            ]
        );
    }

    #[test]
    fn module_stem() {
        assert_eq!(
            descriptor().module_stem(),
            PathBuf::from("kompile/interface/native/interface")
        );
    }

    #[test]
    fn json_is_deterministic() {
        let first = descriptor().to_json().unwrap();
        let second = descriptor().to_json().unwrap();
        assert_eq!(first, second);
        assert!(first.contains("\"kind\": \"origin\""));
    }

    #[test]
    fn rpath_is_relative_to_the_extension() {
        let desc = descriptor();
        let rpaths: Vec<String> = desc
            .runtime_library_dirs
            .iter()
            .map(RuntimeSearchPath::linker_arg)
            .collect();
        assert_eq!(rpaths, vec!["-Wl,-rpath,$ORIGIN"]);
        assert_eq!(RuntimeSearchPath::Origin.to_string(), "$ORIGIN");
    }
}
