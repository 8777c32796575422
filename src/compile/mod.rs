//! Native extension compilation
//!
//! Turns an [`ExtensionDescriptor`](crate::descriptor::ExtensionDescriptor)
//! into one loadable module. It's the equivalent of:
//! ```bash
//! cython -3 --directive embedsignature=True -o build/temp/.../interface.c interface.pyx
//! gcc -fPIC -I... -c build/temp/.../interface.c -o build/temp/.../interface.o
//! gcc -shared build/temp/.../interface.o -L... -Wl,-rpath,'$ORIGIN' -l... -o build/lib/.../interface.so
//! ```
//!
//! Every tool runs with the explicit [`ToolchainConfig`](crate::toolchain::ToolchainConfig)
//! in its environment. There is no fallback compiler and no retry.

pub mod c_extension;
pub mod cython;
pub mod driver;
pub mod tool;
pub mod types;

pub use c_extension::CExtensionCompiler;
pub use cython::{CythonTranslator, DEFAULT_CYTHON};
pub use driver::CompilationDriver;
pub use tool::ToolRunner;
pub use types::{BuildLayout, CompileError, CompiledArtifact};
