//! Wheel writer
//!
//! Writes a [`PackageBundle`] as a binary wheel. The archive is written to a
//! temporary file in the output directory and renamed into place only once
//! it is complete, so a failed build never leaves a wheel behind.

use super::bundle::{PackageBundle, PackageDataFile};
use super::error::PackageError;
use super::record::{self, RecordEntry};
use crate::python::WheelTag;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Build requirements this writer satisfies on its own.
const PROVIDED_BUILD_REQUIRES: [&str; 1] = ["wheel"];

/// The written wheel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelOutput {
    /// Final location of the wheel
    pub path: PathBuf,
    /// Archive paths in the order they were written, `RECORD` last
    pub entries: Vec<String>,
}

/// Writes wheels into one output directory.
#[derive(Debug, Clone)]
pub struct WheelWriter {
    out_dir: PathBuf,
    tag: WheelTag,
}

impl WheelWriter {
    /// Writer producing `<name>-<version>-<tag>.whl` in `out_dir`.
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>, tag: WheelTag) -> Self {
        Self {
            out_dir: out_dir.into(),
            tag,
        }
    }

    /// Wheel file name for `bundle`.
    #[must_use]
    pub fn file_name(&self, bundle: &PackageBundle) -> String {
        format!("{}-{}.whl", bundle.metadata.distribution_stem(), self.tag)
    }

    /// Write `bundle` as a wheel.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle needs a build capability this writer
    /// does not provide, if any input file cannot be read, or if the wheel
    /// cannot be written.
    pub fn write(&self, bundle: &PackageBundle) -> Result<WheelOutput, PackageError> {
        for requirement in &bundle.metadata.build_requires {
            if !PROVIDED_BUILD_REQUIRES.contains(&requirement.as_str()) {
                return Err(PackageError::UnsupportedBuildRequirement {
                    requirement: requirement.clone(),
                });
            }
        }

        fs::create_dir_all(&self.out_dir).map_err(|source| PackageError::Write {
            path: self.out_dir.clone(),
            source,
        })?;

        let final_path = self.out_dir.join(self.file_name(bundle));
        let mut temp =
            NamedTempFile::new_in(&self.out_dir).map_err(|source| PackageError::Write {
                path: self.out_dir.clone(),
                source,
            })?;

        let entries = {
            let mut archive = WheelArchive::new(temp.as_file_mut());
            self.write_contents(&mut archive, bundle)?;
            archive.finish(&bundle.metadata.distribution_stem())?
        };

        temp.persist(&final_path).map_err(|err| PackageError::Write {
            path: final_path.clone(),
            source: err.error,
        })?;

        crate::debug!("Wrote {} ({} entries)", final_path.display(), entries.len());

        Ok(WheelOutput {
            path: final_path,
            entries,
        })
    }

    fn write_contents<W: Write + std::io::Seek>(
        &self,
        archive: &mut WheelArchive<W>,
        bundle: &PackageBundle,
    ) -> Result<(), PackageError> {
        for module in &bundle.modules {
            archive.add_file(module, 0o644)?;
        }

        let extension = PackageDataFile {
            source: bundle.artifact.path.clone(),
            archive_path: bundle.artifact.archive_path(),
        };
        archive.add_file(&extension, 0o755)?;

        for library in bundle.libraries.files() {
            archive.add_file(library, 0o755)?;
        }

        let dist_info = format!("{}.dist-info", bundle.metadata.distribution_stem());
        archive.add_bytes(
            &format!("{dist_info}/METADATA"),
            bundle.metadata.render().as_bytes(),
            0o644,
        )?;
        archive.add_bytes(
            &format!("{dist_info}/WHEEL"),
            self.wheel_file().as_bytes(),
            0o644,
        )?;
        let mut top_level = bundle.metadata.top_level().join("\n");
        top_level.push('\n');
        archive.add_bytes(
            &format!("{dist_info}/top_level.txt"),
            top_level.as_bytes(),
            0o644,
        )?;
        Ok(())
    }

    /// `WHEEL` file contents
    fn wheel_file(&self) -> String {
        format!(
            "Wheel-Version: 1.0\nGenerator: kompile-python ({})\nRoot-Is-Purelib: false\nTag: {}\n",
            env!("CARGO_PKG_VERSION"),
            self.tag
        )
    }
}

/// Zip writer that keeps the `RECORD` lines for what it writes.
struct WheelArchive<W: Write + std::io::Seek> {
    zip: ZipWriter<W>,
    record: Vec<RecordEntry>,
}

impl<W: Write + std::io::Seek> WheelArchive<W> {
    fn new(inner: W) -> Self {
        Self {
            zip: ZipWriter::new(inner),
            record: Vec::new(),
        }
    }

    fn options(mode: u32) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(mode)
    }

    fn add_file(&mut self, file: &PackageDataFile, mode: u32) -> Result<(), PackageError> {
        let contents = fs::read(&file.source).map_err(|source| PackageError::Read {
            path: file.source.clone(),
            source,
        })?;
        self.add_bytes(&file.archive_path, &contents, mode)
    }

    fn add_bytes(&mut self, path: &str, contents: &[u8], mode: u32) -> Result<(), PackageError> {
        let archive_err = |source| PackageError::Archive {
            entry: path.to_string(),
            source,
        };
        self.zip
            .start_file(path, Self::options(mode))
            .map_err(archive_err)?;
        self.zip
            .write_all(contents)
            .map_err(|e| archive_err(zip::result::ZipError::Io(e)))?;
        self.record.push(RecordEntry::for_contents(path, contents));
        Ok(())
    }

    /// Write `RECORD` and close the archive, returning every entry path.
    fn finish(mut self, distribution_stem: &str) -> Result<Vec<String>, PackageError> {
        let record_path = format!("{distribution_stem}.dist-info/RECORD");
        self.record.push(RecordEntry::unhashed(&record_path));
        let contents = record::render(&self.record);

        self.zip
            .start_file(record_path.as_str(), Self::options(0o644))
            .map_err(|source| PackageError::Archive {
                entry: record_path.clone(),
                source,
            })?;
        self.zip
            .write_all(contents.as_bytes())
            .map_err(|e| PackageError::Archive {
                entry: record_path.clone(),
                source: zip::result::ZipError::Io(e),
            })?;
        self.zip.finish().map_err(|source| PackageError::Archive {
            entry: record_path,
            source,
        })?;

        Ok(self.record.into_iter().map(|entry| entry.path).collect())
    }
}

impl<W: Write + std::io::Seek> std::fmt::Debug for WheelArchive<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WheelArchive")
            .field("entries", &self.record.len())
            .finish_non_exhaustive()
    }
}

/// Read one entry back out of a written wheel.
///
/// # Errors
///
/// Returns an error if the wheel cannot be opened or has no such entry.
pub fn read_entry(wheel: &Path, entry: &str) -> Result<Vec<u8>, PackageError> {
    let file = fs::File::open(wheel).map_err(|source| PackageError::Read {
        path: wheel.to_path_buf(),
        source,
    })?;
    let archive_err = |source| PackageError::Archive {
        entry: entry.to_string(),
        source,
    };
    let mut archive = zip::ZipArchive::new(file).map_err(archive_err)?;
    let mut zipped = archive.by_name(entry).map_err(archive_err)?;
    let mut contents = Vec::new();
    std::io::Read::read_to_end(&mut zipped, &mut contents)
        .map_err(|e| archive_err(zip::result::ZipError::Io(e)))?;
    Ok(contents)
}
