//! Build pipeline
//!
//! Strictly sequential:
//!
//! ```text
//! Start -> (paths validated) -> DescriptorBuilt -> (compiled) -> ArtifactReady
//!       -> (packaged) -> BundleEmitted
//! ```
//!
//! Any failure ends the build; there is no retry and no fallback.

use crate::compile::{
    BuildLayout, CompilationDriver, CompileError, CompiledArtifact, CythonTranslator,
};
use crate::config::BuildSettings;
use crate::descriptor::ExtensionDescriptor;
use crate::discovery::{DiscoveredPaths, DiscoveryError};
use crate::package::{PackageBundle, PackageError, PackageMetadata, WheelOutput, WheelWriter};
use crate::python::{PythonEnvironment, PythonError};
use crate::toolchain::ToolchainConfig;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Nothing done yet
    Start,
    /// Paths validated and descriptor constructed
    DescriptorBuilt,
    /// Extension compiled and linked
    ArtifactReady,
    /// Wheel written
    BundleEmitted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::DescriptorBuilt => "descriptor built",
            Self::ArtifactReady => "artifact ready",
            Self::BundleEmitted => "bundle emitted",
        })
    }
}

/// Why a build stopped.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A required path variable is missing
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// The interpreter could not be probed
    #[error(transparent)]
    Python(#[from] PythonError),

    /// Translation, compilation or linking failed
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Collecting files or writing the wheel failed
    #[error(transparent)]
    Package(#[from] PackageError),
}

impl PipelineError {
    /// Process exit status for this failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Compile(err) => err.exit_code(),
            Self::Discovery(_) | Self::Python(_) | Self::Package(_) => 1,
        }
    }

    /// Last state reached before the failure.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Discovery(_) | Self::Python(_) => Stage::Start,
            Self::Compile(_) => Stage::DescriptorBuilt,
            Self::Package(_) => Stage::ArtifactReady,
        }
    }
}

/// What a successful build produced.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Descriptor the extension was built from
    pub descriptor: ExtensionDescriptor,
    /// Built extension
    pub artifact: CompiledArtifact,
    /// Written wheel
    pub wheel: WheelOutput,
    /// Number of native library files bundled
    pub bundled_libraries: usize,
    /// Wall time of the whole build
    pub duration: Duration,
}

/// Runs the build with one explicit toolchain.
#[derive(Debug, Clone)]
pub struct BuildPipeline {
    settings: BuildSettings,
    toolchain: ToolchainConfig,
}

impl BuildPipeline {
    /// Pipeline for `settings`.
    ///
    /// The toolchain is fixed here, before anything else happens.
    #[must_use]
    pub fn new(settings: BuildSettings) -> Self {
        let toolchain = ToolchainConfig::explicit();
        crate::debug!("Toolchain:\n{toolchain}");
        Self {
            settings,
            toolchain,
        }
    }

    /// Resolved settings
    #[must_use]
    pub const fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    /// Toolchain every tool runs with
    #[must_use]
    pub const fn toolchain(&self) -> &ToolchainConfig {
        &self.toolchain
    }

    /// Construct the descriptor without building anything.
    ///
    /// The interpreter is only asked for the numpy header directory when the
    /// settings do not name one.
    ///
    /// # Errors
    ///
    /// Returns an error if the interpreter probe fails.
    pub fn describe(&self, paths: &DiscoveredPaths) -> Result<ExtensionDescriptor, PipelineError> {
        let numpy_include = match &self.settings.numpy_include {
            Some(dir) => dir.clone(),
            None => PythonEnvironment::probe(&self.settings.python)?.require_numpy_include()?,
        };
        Ok(ExtensionDescriptor::new(
            paths,
            &numpy_include,
            &self.settings.source_dir,
        ))
    }

    /// Discover paths from the environment and run the whole build.
    ///
    /// # Errors
    ///
    /// See [`BuildPipeline::run_with_paths`]; additionally fails with
    /// [`PipelineError::Discovery`] before any tool runs.
    pub fn run(&self, observer: &mut dyn FnMut(Stage)) -> Result<BuildReport, PipelineError> {
        let paths = DiscoveredPaths::discover()?;
        self.run_with_paths(&paths, observer)
    }

    /// Run the whole build for already discovered paths.
    ///
    /// `observer` is told about every state reached.
    ///
    /// # Errors
    ///
    /// Returns the first failure of probing, compiling or packaging.
    pub fn run_with_paths(
        &self,
        paths: &DiscoveredPaths,
        observer: &mut dyn FnMut(Stage),
    ) -> Result<BuildReport, PipelineError> {
        let start_time = Instant::now();
        observer(Stage::Start);

        let python = PythonEnvironment::probe(&self.settings.python)?;
        let numpy_include: PathBuf = match &self.settings.numpy_include {
            Some(dir) => dir.clone(),
            None => python.require_numpy_include()?,
        };
        let descriptor = ExtensionDescriptor::new(paths, &numpy_include, &self.settings.source_dir);
        crate::debug_log(&format!("Descriptor for {}", descriptor.name));
        observer(Stage::DescriptorBuilt);

        let driver = CompilationDriver::new(
            &self.toolchain,
            CythonTranslator::new(&self.settings.cython),
            BuildLayout::new(&self.settings.build_dir),
            self.settings.verbose,
        );
        let artifact = driver.build(&descriptor, &python, &self.settings.source_dir)?;
        observer(Stage::ArtifactReady);

        let bundle = PackageBundle::assemble(
            PackageMetadata::kompile(),
            artifact.clone(),
            &self.settings.source_dir,
            Some(paths.library_output_path()),
        )?;
        let bundled_libraries = bundle.libraries.files().len();
        let wheel = WheelWriter::new(&self.settings.out_dir, python.wheel_tag()).write(&bundle)?;
        observer(Stage::BundleEmitted);

        Ok(BuildReport {
            descriptor,
            artifact,
            wheel,
            bundled_libraries,
            duration: start_time.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn settings() -> BuildSettings {
        let mut settings = BuildSettings::with_defaults(Path::new("/project"));
        settings.numpy_include = Some(PathBuf::from("/numpy/include"));
        settings
    }

    #[test]
    fn describe_with_explicit_numpy_include() {
        let pipeline = BuildPipeline::new(settings());
        let paths = DiscoveredPaths::new("/lib", "/inc");

        let descriptor = pipeline.describe(&paths).unwrap();
        assert_eq!(
            descriptor.include_dirs,
            vec![PathBuf::from("/numpy/include"), PathBuf::from("/inc")]
        );
        assert_eq!(
            descriptor.source,
            PathBuf::from("/project/kompile/interface/native/interface.pyx")
        );
    }

    #[test]
    fn describe_is_deterministic() {
        let pipeline = BuildPipeline::new(settings());
        let paths = DiscoveredPaths::new("/lib", "/inc");

        let first = pipeline.describe(&paths).unwrap().to_json().unwrap();
        let second = pipeline.describe(&paths).unwrap().to_json().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn toolchain_is_explicit_from_the_start() {
        let pipeline = BuildPipeline::new(settings());
        assert_eq!(pipeline.toolchain(), &ToolchainConfig::explicit());
    }

    #[test]
    fn missing_interpreter_aborts_at_start() {
        let mut settings = settings();
        settings.python = "kompile-no-such-python-interpreter".to_string();
        let pipeline = BuildPipeline::new(settings);
        let paths = DiscoveredPaths::new("/lib", "/inc");

        let mut seen = Vec::new();
        let err = pipeline
            .run_with_paths(&paths, &mut |stage| seen.push(stage))
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Start);
        assert_eq!(err.exit_code(), 1);
        assert_eq!(seen, vec![Stage::Start]);
    }

    #[test]
    fn exit_codes() {
        assert_eq!(
            PipelineError::from(DiscoveryError::MissingIncludePath).exit_code(),
            1
        );
        let compile = PipelineError::from(CompileError::Failed {
            tool: "linker".to_string(),
            code: Some(2),
            output: String::new(),
        });
        assert_eq!(compile.exit_code(), 2);
        assert_eq!(compile.stage(), Stage::DescriptorBuilt);
    }

    #[test]
    fn stages_are_ordered() {
        assert!(Stage::Start < Stage::DescriptorBuilt);
        assert!(Stage::DescriptorBuilt < Stage::ArtifactReady);
        assert!(Stage::ArtifactReady < Stage::BundleEmitted);
    }
}
