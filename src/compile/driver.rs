//! Compilation driver
//!
//! Runs translation, compilation and linking in order and hands back the
//! single built module. The first failing step ends the build.

use super::c_extension::CExtensionCompiler;
use super::cython::CythonTranslator;
use super::tool::ToolRunner;
use super::types::{BuildLayout, CompileError, CompiledArtifact};
use crate::descriptor::ExtensionDescriptor;
use crate::python::PythonEnvironment;
use crate::toolchain::ToolchainConfig;
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Builds an [`ExtensionDescriptor`] into a [`CompiledArtifact`].
#[derive(Debug)]
pub struct CompilationDriver<'a> {
    toolchain: &'a ToolchainConfig,
    cython: CythonTranslator,
    layout: BuildLayout,
    verbose: bool,
}

impl<'a> CompilationDriver<'a> {
    /// Driver using `toolchain` for every tool it runs.
    #[must_use]
    pub const fn new(
        toolchain: &'a ToolchainConfig,
        cython: CythonTranslator,
        layout: BuildLayout,
        verbose: bool,
    ) -> Self {
        Self {
            toolchain,
            cython,
            layout,
            verbose,
        }
    }

    /// Build layout in use
    #[must_use]
    pub const fn layout(&self) -> &BuildLayout {
        &self.layout
    }

    /// Translate, compile and link the extension.
    ///
    /// `source_dir` is the root of the package tree and is put on Cython's
    /// include path.
    ///
    /// # Errors
    ///
    /// Returns the first failure. Tool failures carry the tool's own output.
    pub fn build(
        &self,
        descriptor: &ExtensionDescriptor,
        python: &PythonEnvironment,
        source_dir: &Path,
    ) -> Result<CompiledArtifact, CompileError> {
        let start_time = Instant::now();
        let runner = ToolRunner::new(self.toolchain, self.verbose);
        let stem = descriptor.module_stem();

        let c_source = self.layout.c_source(&stem);
        let object = self.layout.object(&stem);
        let module = self.layout.module(&stem, &python.ext_suffix);

        if self.verbose {
            println!("Building extension {}", descriptor.name);
            println!("  source: {}", descriptor.source.display());
            println!("  build:  {}", self.layout.build_dir.display());
        }

        create_parent(&c_source)?;
        create_parent(&module)?;

        // Step 1: .pyx -> .c
        self.cython
            .translate(&runner, &descriptor.source, &c_source, source_dir)?;

        // Step 2: .c -> .o
        let compiler = CExtensionCompiler::new(descriptor, &python.include);
        compiler.compile(&runner, &c_source, &object)?;

        // Step 3: .o -> shared module
        compiler.link(&runner, &object, &module)?;

        crate::debug!("Built {} in {:?}", module.display(), start_time.elapsed());

        Ok(CompiledArtifact {
            module_name: descriptor.name.clone(),
            path: module,
            ext_suffix: python.ext_suffix.clone(),
        })
    }
}

fn create_parent(path: &Path) -> Result<(), CompileError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(parent).map_err(|source| CompileError::Io {
        path: parent.to_path_buf(),
        source,
    })
}
