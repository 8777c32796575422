//! C compile and link
//!
//! Compiles the translated C source into an object and links it into a
//! shared module. Both command lines are assembled from the explicit
//! toolchain plus the descriptor; nothing is inherited from the interpreter's
//! own build configuration except its header directory.

use super::tool::ToolRunner;
use super::types::CompileError;
use crate::descriptor::ExtensionDescriptor;
use crate::toolchain::ToolchainConfig;
use std::path::Path;
use std::process::Command;

/// Compiles and links one C extension module.
#[derive(Debug)]
pub struct CExtensionCompiler<'a> {
    descriptor: &'a ExtensionDescriptor,
    python_include: &'a Path,
}

impl<'a> CExtensionCompiler<'a> {
    /// Compiler for `descriptor`, adding `python_include` to the header path.
    #[must_use]
    pub const fn new(descriptor: &'a ExtensionDescriptor, python_include: &'a Path) -> Self {
        Self {
            descriptor,
            python_include,
        }
    }

    /// `gcc -fPIC -I<dirs> -I<python> <extra> -c <source> -o <object>`
    ///
    /// # Errors
    ///
    /// Returns an error if `CC` is empty.
    pub fn compile_command(
        &self,
        toolchain: &ToolchainConfig,
        c_source: &Path,
        object: &Path,
    ) -> Result<Command, CompileError> {
        let mut cmd = toolchain.compiler_invocation()?.command();
        cmd.args(self.descriptor.include_args());
        cmd.arg(format!("-I{}", self.python_include.display()));
        cmd.args(&self.descriptor.extra_compile_args);
        cmd.arg("-c").arg(c_source);
        cmd.arg("-o").arg(object);
        Ok(cmd)
    }

    /// `gcc -shared <object> -L<dirs> -Wl,-rpath,$ORIGIN -l<libs> -o <module>`
    ///
    /// # Errors
    ///
    /// Returns an error if `LDSHARED` is empty.
    pub fn link_command(
        &self,
        toolchain: &ToolchainConfig,
        object: &Path,
        module: &Path,
    ) -> Result<Command, CompileError> {
        let mut cmd = toolchain.linker_invocation()?.command();
        cmd.arg(object);
        cmd.args(self.descriptor.link_args());
        cmd.arg("-o").arg(module);
        Ok(cmd)
    }

    /// Compile `c_source` into `object`.
    ///
    /// # Errors
    ///
    /// Returns an error if the compiler cannot be run or fails.
    pub fn compile(
        &self,
        runner: &ToolRunner<'_>,
        c_source: &Path,
        object: &Path,
    ) -> Result<String, CompileError> {
        let cmd = self.compile_command(runner.toolchain(), c_source, object)?;
        runner.run("compiler", cmd)
    }

    /// Link `object` into `module`.
    ///
    /// # Errors
    ///
    /// Returns an error if the linker cannot be run or fails.
    pub fn link(
        &self,
        runner: &ToolRunner<'_>,
        object: &Path,
        module: &Path,
    ) -> Result<String, CompileError> {
        let cmd = self.link_command(runner.toolchain(), object, module)?;
        runner.run("linker", cmd)
    }
}
