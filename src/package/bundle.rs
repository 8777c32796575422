//! Package bundle
//!
//! Everything that goes into the wheel: metadata, the built extension, the
//! pure-Python modules of each declared package, and (when the native
//! library directory is known) a copy of every file in it.

use super::error::PackageError;
use crate::compile::CompiledArtifact;
use std::fs;
use std::path::{Path, PathBuf};

/// Distribution name
pub const PACKAGE_NAME: &str = "kompile";

/// Distribution version
pub const PACKAGE_VERSION: &str = "0.0.1";

/// Author name
pub const AUTHOR: &str = "Adam Gibson";

/// Author email
pub const AUTHOR_EMAIL: &str = "adam@konduit.ai";

/// Package that owns the extension and receives the native libraries
pub const NATIVE_PACKAGE: &str = "kompile.interface.native";

/// Packages shipped in the wheel
pub const PACKAGES: [&str; 2] = [NATIVE_PACKAGE, "kompile.interface.python"];

/// Packaging capabilities the bundle needs at build time
pub const BUILD_REQUIRES: [&str; 1] = ["wheel"];

/// Distribution metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    /// Distribution name
    pub name: String,
    /// Version string
    pub version: String,
    /// Author name
    pub author: String,
    /// Author email
    pub author_email: String,
    /// Dotted package names
    pub packages: Vec<String>,
    /// Build-time requirements
    pub build_requires: Vec<String>,
}

impl PackageMetadata {
    /// Metadata of the `kompile` distribution.
    #[must_use]
    pub fn kompile() -> Self {
        Self {
            name: PACKAGE_NAME.to_string(),
            version: PACKAGE_VERSION.to_string(),
            author: AUTHOR.to_string(),
            author_email: AUTHOR_EMAIL.to_string(),
            packages: PACKAGES.iter().map(ToString::to_string).collect(),
            build_requires: BUILD_REQUIRES.iter().map(ToString::to_string).collect(),
        }
    }

    /// Core metadata (`METADATA` file contents).
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "Metadata-Version: 2.1\nName: {}\nVersion: {}\nAuthor: {}\nAuthor-email: {}\n",
            self.name, self.version, self.author, self.author_email
        )
    }

    /// Top-level import names (`top_level.txt` contents).
    #[must_use]
    pub fn top_level(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .packages
            .iter()
            .filter_map(|p| p.split('.').next())
            .map(ToString::to_string)
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Name used in wheel and dist-info file names.
    #[must_use]
    pub fn distribution_stem(&self) -> String {
        format!("{}-{}", self.name.replace('-', "_"), self.version)
    }
}

impl Default for PackageMetadata {
    fn default() -> Self {
        Self::kompile()
    }
}

/// A file copied into the wheel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDataFile {
    /// File on disk
    pub source: PathBuf,
    /// Path inside the wheel, `/`-separated
    pub archive_path: String,
}

impl PackageDataFile {
    /// File `source` placed in `package` under its own file name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file name is not valid UTF-8.
    pub fn in_package(source: PathBuf, package: &str) -> Result<Self, PackageError> {
        let file_name = source
            .file_name()
            .and_then(std::ffi::OsStr::to_str)
            .ok_or_else(|| PackageError::InvalidName {
                path: source.clone(),
            })?
            .to_string();
        let archive_path = format!("{}/{file_name}", package.replace('.', "/"));
        Ok(Self {
            source,
            archive_path,
        })
    }
}

/// Native library files attached to the native package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageData {
    /// Every file found in the library output directory
    WithBundledLibraries(Vec<PackageDataFile>),
    /// No library directory was given
    WithoutBundledLibraries,
}

impl PackageData {
    /// The bundled files, empty for [`PackageData::WithoutBundledLibraries`]
    #[must_use]
    pub fn files(&self) -> &[PackageDataFile] {
        match self {
            Self::WithBundledLibraries(files) => files,
            Self::WithoutBundledLibraries => &[],
        }
    }
}

/// The complete contents of one wheel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageBundle {
    /// Distribution metadata
    pub metadata: PackageMetadata,
    /// Built extension module
    pub artifact: CompiledArtifact,
    /// Pure-Python modules of the declared packages
    pub modules: Vec<PackageDataFile>,
    /// Native libraries copied into the native package
    pub libraries: PackageData,
}

impl PackageBundle {
    /// Collect a bundle.
    ///
    /// With `library_output_path` every regular file in it becomes package
    /// data of [`NATIVE_PACKAGE`]; without it the bundle carries the
    /// extension and modules only. A library file with the same name as a
    /// package module replaces that module.
    ///
    /// # Errors
    ///
    /// Returns an error if a package directory or the library directory
    /// cannot be read, or if a library file has the name of the extension
    /// module.
    pub fn assemble(
        metadata: PackageMetadata,
        artifact: CompiledArtifact,
        source_dir: &Path,
        library_output_path: Option<&Path>,
    ) -> Result<Self, PackageError> {
        let mut modules = collect_package_modules(source_dir, &metadata.packages)?;

        let libraries = match library_output_path {
            Some(dir) => {
                let files = enumerate_package_data(dir, NATIVE_PACKAGE)?;
                crate::debug!(
                    "Copying {} files from library output path {}",
                    files.len(),
                    dir.display()
                );

                let extension_path = artifact.archive_path();
                if let Some(clash) = files.iter().find(|f| f.archive_path == extension_path) {
                    return Err(PackageError::Conflict {
                        entry: extension_path,
                        path: clash.source.clone(),
                    });
                }
                modules.retain(|module| {
                    let shadowed = files.iter().any(|f| f.archive_path == module.archive_path);
                    if shadowed {
                        crate::debug!("Library file replaces module {}", module.archive_path);
                    }
                    !shadowed
                });

                PackageData::WithBundledLibraries(files)
            }
            None => PackageData::WithoutBundledLibraries,
        };

        Ok(Self {
            metadata,
            artifact,
            modules,
            libraries,
        })
    }
}

/// Every regular file directly inside `dir`, as package data of `package`.
///
/// Sorted by file name. Subdirectories are skipped.
///
/// # Errors
///
/// Returns an error if the directory cannot be read or a file name is not
/// valid UTF-8.
pub fn enumerate_package_data(
    dir: &Path,
    package: &str,
) -> Result<Vec<PackageDataFile>, PackageError> {
    let mut files = Vec::new();
    for path in list_dir(dir)? {
        if path.is_file() {
            files.push(PackageDataFile::in_package(path, package)?);
        } else {
            crate::debug!("Skipping non-file entry {}", path.display());
        }
    }
    files.sort_by(|a, b| a.archive_path.cmp(&b.archive_path));
    Ok(files)
}

/// `*.py` files directly inside each package directory under `source_dir`.
fn collect_package_modules(
    source_dir: &Path,
    packages: &[String],
) -> Result<Vec<PackageDataFile>, PackageError> {
    let mut modules = Vec::new();
    for package in packages {
        let package_dir: PathBuf = source_dir.join(package.split('.').collect::<PathBuf>());
        let mut found = Vec::new();
        for path in list_dir(&package_dir)? {
            if path.is_file() && path.extension().is_some_and(|ext| ext == "py") {
                found.push(PackageDataFile::in_package(path, package)?);
            }
        }
        found.sort_by(|a, b| a.archive_path.cmp(&b.archive_path));
        modules.extend(found);
    }
    Ok(modules)
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, PackageError> {
    let read_err = |source| PackageError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        paths.push(entry.map_err(read_err)?.path());
    }
    Ok(paths)
}
