//! Running build tools

use super::types::CompileError;
use crate::toolchain::{ToolchainConfig, display_command};
use std::process::Command;

/// Runs build tools with the explicit toolchain in their environment.
#[derive(Debug)]
pub struct ToolRunner<'a> {
    toolchain: &'a ToolchainConfig,
    verbose: bool,
}

impl<'a> ToolRunner<'a> {
    /// Runner that applies `toolchain` to every command.
    #[must_use]
    pub const fn new(toolchain: &'a ToolchainConfig, verbose: bool) -> Self {
        Self { toolchain, verbose }
    }

    /// The toolchain commands are run with
    #[must_use]
    pub const fn toolchain(&self) -> &'a ToolchainConfig {
        self.toolchain
    }

    /// Apply the toolchain to `cmd`, run it, and return its combined output.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Spawn`] if the tool cannot be started and
    /// [`CompileError::Failed`] if it exits unsuccessfully.
    pub fn run(&self, tool: &str, mut cmd: Command) -> Result<String, CompileError> {
        self.toolchain.apply(&mut cmd);

        let line = display_command(&cmd);
        if self.verbose {
            println!("  Running: {line}");
        }
        crate::debug!("exec: {line}");

        let output = cmd.output().map_err(|source| CompileError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

        let mut combined = String::new();
        combined.push_str(&String::from_utf8_lossy(&output.stdout));
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(CompileError::Failed {
                tool: tool.to_string(),
                code: output.status.code(),
                output: combined,
            });
        }

        if self.verbose && !combined.trim().is_empty() {
            print!("{combined}");
        }

        Ok(combined)
    }
}
