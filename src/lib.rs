//! Kompile Python build library code
//!
//! Builds the `kompile` Python package: translates the Cython bridge module,
//! compiles and links it against the native kompile libraries with a fixed
//! GCC toolchain, and packages the result into a wheel that carries those
//! libraries next to the extension.

pub mod compile;
pub mod config;
pub mod debug;
pub mod descriptor;
pub mod discovery;
pub mod env_vars;
pub mod package;
pub mod pipeline;
pub mod python;
pub mod toolchain;

// Re-export common types for convenience
pub use compile::{
    BuildLayout, CExtensionCompiler, CompilationDriver, CompileError, CompiledArtifact,
    CythonTranslator, ToolRunner,
};
pub use config::{BuildSettings, Config, SettingsOverrides};
pub use debug::{debug_log, init_debug, is_debug_enabled};
pub use descriptor::{ExtensionDescriptor, Language, RuntimeSearchPath};
pub use discovery::{DiscoveredPaths, DiscoveryError};
pub use package::{
    PackageBundle, PackageData, PackageDataFile, PackageError, PackageMetadata, WheelOutput,
    WheelWriter, enumerate_package_data,
};
pub use pipeline::{BuildPipeline, BuildReport, PipelineError, Stage};
pub use python::{PythonEnvironment, PythonError, WheelTag};
pub use toolchain::{TOOLCHAIN_KEYS, ToolchainConfig, ToolchainError};
