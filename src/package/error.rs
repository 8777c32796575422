//! Packaging errors

use std::path::PathBuf;

/// Errors from collecting package contents or writing the wheel.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    /// Reading a file or directory failed
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// Path being read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Writing the wheel failed
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// Path being written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The zip container rejected an entry
    #[error("failed to add {entry} to wheel: {source}")]
    Archive {
        /// Archive path of the entry
        entry: String,
        /// Underlying zip error
        source: zip::result::ZipError,
    },

    /// The bundle needs a build capability the writer does not provide
    #[error("unsupported build requirement: {requirement}")]
    UnsupportedBuildRequirement {
        /// Requirement name
        requirement: String,
    },

    /// A bundled library would replace the built extension
    #[error("library file {} would overwrite the extension module {entry}", .path.display())]
    Conflict {
        /// Archive path both files map to
        entry: String,
        /// Library file on disk
        path: PathBuf,
    },

    /// A path cannot be stored in a wheel
    #[error("cannot package non UTF-8 file name: {}", .path.display())]
    InvalidName {
        /// Offending path
        path: PathBuf,
    },
}
