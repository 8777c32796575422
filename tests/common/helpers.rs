//! Shared test helpers and utilities

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Path to the compiled `kompile-python` binary
pub(crate) fn get_kompile_binary() -> &'static str {
    env!("CARGO_BIN_EXE_kompile-python")
}

/// A command for the binary with every variable the build reads removed,
/// so the caller's shell cannot leak into the test.
#[allow(dead_code)]
pub(crate) fn kompile_command() -> Command {
    let mut cmd = Command::new(get_kompile_binary());
    for var in [
        "LIB_OUTPUT_PATH",
        "INCLUDE_PATH",
        "PYTHON",
        "CYTHON",
        "KOMPILE_DEBUG",
    ] {
        cmd.env_remove(var);
    }
    // Keep the user config out of the picture
    cmd.env("XDG_CONFIG_HOME", std::env::temp_dir().join("kompile-python-tests"));
    cmd
}

/// Create a minimal package tree: the bridging source and both package
/// directories, each with an `__init__.py`.
///
/// # Returns
/// The source directory
#[allow(dead_code)]
pub(crate) fn create_source_tree(temp_dir: &TempDir) -> PathBuf {
    let source_dir = temp_dir.path().join("src");
    let native = source_dir.join("kompile/interface/native");
    let python = source_dir.join("kompile/interface/python");
    fs::create_dir_all(&native).expect("Failed to create native package");
    fs::create_dir_all(&python).expect("Failed to create python package");

    fs::write(native.join("__init__.py"), "").expect("Failed to write __init__.py");
    fs::write(
        native.join("interface.pyx"),
        "# cython: language_level=3\ncdef extern from \"kompile.h\":\n    pass\n",
    )
    .expect("Failed to write interface.pyx");
    fs::write(python.join("__init__.py"), "").expect("Failed to write __init__.py");
    fs::write(python.join("kompile.py"), "def compile():\n    pass\n")
        .expect("Failed to write kompile.py");

    source_dir
}

/// Create a library output directory holding both link targets, one
/// unrelated file and one subdirectory.
///
/// # Returns
/// The library directory
#[allow(dead_code)]
pub(crate) fn create_library_dir(temp_dir: &TempDir) -> PathBuf {
    let lib_dir = temp_dir.path().join("lib");
    fs::create_dir_all(lib_dir.join("cmake")).expect("Failed to create lib dir");
    fs::write(lib_dir.join("libkompile_c_library.so"), b"\x7fELF c library")
        .expect("Failed to write library");
    fs::write(lib_dir.join("libkompile-image.so"), b"\x7fELF image")
        .expect("Failed to write library");
    fs::write(lib_dir.join("extra.dat"), b"extra").expect("Failed to write extra.dat");
    lib_dir
}

/// Create an include directory with one header.
#[allow(dead_code)]
pub(crate) fn create_include_dir(temp_dir: &TempDir) -> PathBuf {
    let include_dir = temp_dir.path().join("include");
    fs::create_dir_all(&include_dir).expect("Failed to create include dir");
    fs::write(include_dir.join("kompile.h"), "int kompile(void);\n")
        .expect("Failed to write header");
    include_dir
}

/// Write an executable shell script.
#[cfg(unix)]
#[allow(dead_code)]
pub(crate) fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(dir).expect("Failed to create script dir");
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}")).expect("Failed to write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .expect("Failed to make script executable");
    path
}

/// Install stand-ins for `python`, `cython` and `gcc` in `bin_dir`.
///
/// The interpreter reports Python 3.9 on `linux-x86_64` with NumPy headers
/// at `numpy_include`. The translator and compiler write their `-o` output
/// and append the toolchain variables they saw, then their arguments, to
/// `tool.log` as `name|CC=..|LDSHARED=..|CFLAGS=..|LDFLAGS=..|ARGS=..`.
#[cfg(unix)]
#[allow(dead_code)]
pub(crate) fn install_fake_tools(bin_dir: &Path, numpy_include: &Path) -> PathBuf {
    let python_include = bin_dir.join("python-include");
    fs::create_dir_all(&python_include).expect("Failed to create python include");
    let probe = format!(
        r#"{{"executable": "{bin}/python", "version": [3, 9], "include": "{include}", "ext_suffix": ".cpython-39-x86_64-linux-gnu.so", "platform": "linux-x86_64", "numpy_include": "{numpy}"}}"#,
        bin = bin_dir.display(),
        include = python_include.display(),
        numpy = numpy_include.display(),
    );
    write_script(bin_dir, "python", &format!("printf '%s\\n' '{probe}'\n"));

    let log = bin_dir.join("tool.log");
    let emitter = format!(
        r#"args="$*"
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift; fi
  shift
done
printf '%s|CC=%s|LDSHARED=%s|CFLAGS=%s|LDFLAGS=%s|ARGS=%s\n' "$(basename "$0")" "$CC" "$LDSHARED" "$CFLAGS" "$LDFLAGS" "$args" >> "{log}"
printf 'built by %s\n' "$(basename "$0")" > "$out"
"#,
        log = log.display()
    );
    write_script(bin_dir, "cython", &emitter);
    write_script(bin_dir, "gcc", &emitter);
    log
}

/// `PATH` with `dir` in front.
#[allow(dead_code)]
pub(crate) fn path_with(dir: &Path) -> std::ffi::OsString {
    let mut paths = vec![dir.to_path_buf()];
    if let Some(existing) = std::env::var_os("PATH") {
        paths.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(paths).expect("Failed to join PATH")
}
