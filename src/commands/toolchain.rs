//! Toolchain command
//!
//! Show the explicit compiler and linker configuration

use anyhow::{Context, Result};
use kompile_python::ToolchainConfig;

/// Print the toolchain table, as aligned `KEY = "value"` lines or JSON.
pub(crate) fn run(json: bool) -> Result<()> {
    let toolchain = ToolchainConfig::explicit();

    if json {
        let output =
            serde_json::to_string_pretty(&toolchain).context("Failed to serialize toolchain")?;
        println!("{output}");
    } else {
        print!("{toolchain}");
    }

    Ok(())
}
