//! Explicit compiler and linker configuration
//!
//! Python's build tooling inherits its compiler settings from however the
//! interpreter itself was built. Those settings carry architecture, debug and
//! hardening flags that break linkage against the prebuilt kompile libraries,
//! so none of them are used. Instead every build tool is driven from one
//! explicit table, and every spawned process sees exactly these values.

use serde::Serialize;
use std::ffi::OsStr;
use std::fmt;
use std::process::Command;

/// The full set of toolchain keys, in the order they are applied.
pub const TOOLCHAIN_KEYS: [&str; 15] = [
    "CFLAGS",
    "OPT",
    "PY_CFLAGS",
    "PY_CORE_CFLAGS",
    "CC",
    "CXX",
    "BASECFLAGS",
    "CCSHARED",
    "LDSHARED",
    "CPP",
    "CPPFLAGS",
    "BLDSHARED",
    "CONFIGURE_LDFLAGS",
    "LDFLAGS",
    "PY_LDFLAGS",
];

/// Explicit toolchain configuration.
///
/// Every field is required, so a partially overridden toolchain cannot be
/// constructed. Flag accumulators are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ToolchainConfig {
    /// `CFLAGS`
    pub cflags: String,
    /// `OPT`
    pub opt: String,
    /// `PY_CFLAGS`
    pub py_cflags: String,
    /// `PY_CORE_CFLAGS`
    pub py_core_cflags: String,
    /// `CC`
    pub cc: String,
    /// `CXX`
    pub cxx: String,
    /// `BASECFLAGS`
    pub basecflags: String,
    /// `CCSHARED`
    pub ccshared: String,
    /// `LDSHARED`
    pub ldshared: String,
    /// `CPP`
    pub cpp: String,
    /// `CPPFLAGS`
    pub cppflags: String,
    /// `BLDSHARED`
    pub bldshared: String,
    /// `CONFIGURE_LDFLAGS`
    pub configure_ldflags: String,
    /// `LDFLAGS`
    pub ldflags: String,
    /// `PY_LDFLAGS`
    pub py_ldflags: String,
}

impl ToolchainConfig {
    /// The one toolchain every build uses: `gcc`, `-fPIC`, `gcc -shared`,
    /// and nothing else.
    #[must_use]
    pub fn explicit() -> Self {
        Self {
            cflags: String::new(),
            opt: String::new(),
            py_cflags: String::new(),
            py_core_cflags: String::new(),
            cc: "gcc".to_string(),
            cxx: "g++".to_string(),
            basecflags: String::new(),
            ccshared: "-fPIC".to_string(),
            ldshared: "gcc -shared".to_string(),
            cpp: String::new(),
            cppflags: String::new(),
            bldshared: String::new(),
            configure_ldflags: String::new(),
            ldflags: String::new(),
            py_ldflags: String::new(),
        }
    }

    /// Key/value pairs in [`TOOLCHAIN_KEYS`] order.
    #[must_use]
    pub fn entries(&self) -> [(&'static str, &str); 15] {
        [
            ("CFLAGS", self.cflags.as_str()),
            ("OPT", self.opt.as_str()),
            ("PY_CFLAGS", self.py_cflags.as_str()),
            ("PY_CORE_CFLAGS", self.py_core_cflags.as_str()),
            ("CC", self.cc.as_str()),
            ("CXX", self.cxx.as_str()),
            ("BASECFLAGS", self.basecflags.as_str()),
            ("CCSHARED", self.ccshared.as_str()),
            ("LDSHARED", self.ldshared.as_str()),
            ("CPP", self.cpp.as_str()),
            ("CPPFLAGS", self.cppflags.as_str()),
            ("BLDSHARED", self.bldshared.as_str()),
            ("CONFIGURE_LDFLAGS", self.configure_ldflags.as_str()),
            ("LDFLAGS", self.ldflags.as_str()),
            ("PY_LDFLAGS", self.py_ldflags.as_str()),
        ]
    }

    /// Overwrite every toolchain key in the child's environment.
    ///
    /// Values exported by the operator's shell never reach the build tools.
    pub fn apply(&self, cmd: &mut Command) {
        for (key, value) in self.entries() {
            cmd.env(key, value);
        }
    }

    /// Compiler program followed by the flags every object is compiled with.
    ///
    /// Assembled from `CC`, `BASECFLAGS`, `OPT`, `CFLAGS`, `CCSHARED` and
    /// `CPPFLAGS`.
    ///
    /// # Errors
    ///
    /// Returns an error if `CC` is empty.
    pub fn compiler_invocation(&self) -> Result<Invocation, ToolchainError> {
        let mut words = split_words(&self.cc);
        if words.is_empty() {
            return Err(ToolchainError::EmptyProgram { key: "CC" });
        }
        for flags in [
            &self.basecflags,
            &self.opt,
            &self.cflags,
            &self.ccshared,
            &self.cppflags,
        ] {
            words.extend(split_words(flags));
        }
        Ok(Invocation::from_words(words))
    }

    /// Shared linker program followed by its flags.
    ///
    /// Assembled from `LDSHARED` and `LDFLAGS`.
    ///
    /// # Errors
    ///
    /// Returns an error if `LDSHARED` is empty.
    pub fn linker_invocation(&self) -> Result<Invocation, ToolchainError> {
        let mut words = split_words(&self.ldshared);
        if words.is_empty() {
            return Err(ToolchainError::EmptyProgram { key: "LDSHARED" });
        }
        words.extend(split_words(&self.ldflags));
        Ok(Invocation::from_words(words))
    }
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self::explicit()
    }
}

impl fmt::Display for ToolchainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.entries() {
            writeln!(f, "{key:<18} = {value:?}")?;
        }
        Ok(())
    }
}

/// A program plus the leading arguments it must always receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to execute
    pub program: String,
    /// Arguments placed before any per-call arguments
    pub args: Vec<String>,
}

impl Invocation {
    fn from_words(mut words: Vec<String>) -> Self {
        let program = words.remove(0);
        Self {
            program,
            args: words,
        }
    }

    /// Start a [`Command`] for this invocation.
    #[must_use]
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// Errors from assembling command lines out of the toolchain table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ToolchainError {
    /// A key that must name a program is empty
    #[error("toolchain key {key} does not name a program")]
    EmptyProgram {
        /// The offending key
        key: &'static str,
    },
}

fn split_words(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

/// Render a command line for display in verbose output.
#[must_use]
pub fn display_command(cmd: &Command) -> String {
    let mut line = cmd.get_program().to_string_lossy().into_owned();
    for arg in cmd.get_args() {
        line.push(' ');
        line.push_str(&quote_arg(arg));
    }
    line
}

fn quote_arg(arg: &OsStr) -> String {
    let arg = arg.to_string_lossy();
    if arg.is_empty() || arg.contains(char::is_whitespace) {
        format!("'{arg}'")
    } else {
        arg.into_owned()
    }
}
