//! End-to-end tests for `kompile-python build`.
//!
//! The Unix tests put stand-in `python`, `cython` and `gcc` scripts first on
//! `PATH`, so the whole pipeline runs without a real toolchain.

mod common;

use common::helpers::{create_include_dir, create_library_dir, create_source_tree, kompile_command};
use tempfile::TempDir;

#[cfg(unix)]
mod with_fake_tools {
    use super::*;
    use common::helpers::{install_fake_tools, path_with, write_script};
    use kompile_python::package::read_entry;
    use std::fs;

    const WHEEL_NAME: &str = "kompile-0.0.1-cp39-cp39-linux_x86_64.whl";
    const EXTENSION_ENTRY: &str =
        "kompile/interface/native/interface.cpython-39-x86_64-linux-gnu.so";

    #[test]
    fn builds_wheel_with_bundled_libraries() {
        let temp = TempDir::new().unwrap();
        let source_dir = create_source_tree(&temp);
        let lib_dir = create_library_dir(&temp);
        let include_dir = create_include_dir(&temp);
        let bin_dir = temp.path().join("bin");
        let log = install_fake_tools(&bin_dir, &temp.path().join("numpy"));
        let out_dir = temp.path().join("wheels");

        let output = kompile_command()
            .args(["build", "--source-dir"])
            .arg(&source_dir)
            .arg("--out-dir")
            .arg(&out_dir)
            .args(["--python", "python", "--cython", "cython"])
            .env("PATH", path_with(&bin_dir))
            .env("LIB_OUTPUT_PATH", &lib_dir)
            .env("INCLUDE_PATH", &include_dir)
            .env("CFLAGS", "-O3 -march=native")
            .env("LDFLAGS", "-L/opt/conda/lib")
            .output()
            .unwrap();

        assert!(
            output.status.success(),
            "stdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains(&format!(
            "Copied 3 files from library output path {}",
            lib_dir.display()
        )));

        let wheel = out_dir.join(WHEEL_NAME);
        assert!(wheel.is_file());

        // Libraries are carried byte for byte; the subdirectory is not
        assert_eq!(
            read_entry(&wheel, "kompile/interface/native/libkompile_c_library.so").unwrap(),
            fs::read(lib_dir.join("libkompile_c_library.so")).unwrap()
        );
        assert_eq!(
            read_entry(&wheel, "kompile/interface/native/libkompile-image.so").unwrap(),
            fs::read(lib_dir.join("libkompile-image.so")).unwrap()
        );
        assert_eq!(
            read_entry(&wheel, "kompile/interface/native/extra.dat").unwrap(),
            b"extra"
        );
        assert!(read_entry(&wheel, "kompile/interface/native/cmake").is_err());

        // The extension module sits next to the libraries
        assert_eq!(
            read_entry(&wheel, EXTENSION_ENTRY).unwrap(),
            b"built by gcc\n"
        );
        assert!(read_entry(&wheel, "kompile/interface/python/kompile.py").is_ok());

        let record = String::from_utf8(
            read_entry(&wheel, "kompile-0.0.1.dist-info/RECORD").unwrap(),
        )
        .unwrap();
        assert!(record.contains(EXTENSION_ENTRY));
        assert!(record.contains("kompile-0.0.1.dist-info/RECORD,,"));

        // Every tool saw the explicit toolchain, not the caller's flags
        let log = fs::read_to_string(log).unwrap();
        let calls: Vec<(&str, &str)> = log
            .lines()
            .map(|line| line.split_once("|ARGS=").unwrap())
            .collect();
        assert_eq!(calls.len(), 3, "log: {log}");
        for (env, _) in &calls {
            assert!(
                env.ends_with("|CC=gcc|LDSHARED=gcc -shared|CFLAGS=|LDFLAGS="),
                "{env}"
            );
        }

        // Compile sees numpy, INCLUDE_PATH and the interpreter headers only;
        // link carries the library path, $ORIGIN and both targets
        let build = source_dir.join("build");
        let object = build.join("temp/kompile/interface/native/interface.o");
        let compile_args = format!(
            "-fPIC -I{} -I{} -I{} -c {} -o {}",
            temp.path().join("numpy").display(),
            include_dir.display(),
            bin_dir.join("python-include").display(),
            build.join("temp/kompile/interface/native/interface.c").display(),
            object.display()
        );
        let link_args = format!(
            "-shared {} -L{} -Wl,-rpath,$ORIGIN -lkompile_c_library -lkompile-image -o {}",
            object.display(),
            lib_dir.display(),
            build.join("lib").join(EXTENSION_ENTRY).display()
        );
        let gcc_calls: Vec<&str> = calls
            .iter()
            .filter(|(env, _)| env.starts_with("gcc|"))
            .map(|(_, args)| *args)
            .collect();
        assert_eq!(gcc_calls, vec![compile_args.as_str(), link_args.as_str()]);

        // Intermediates under the default build directory
        assert!(
            source_dir
                .join("build/temp/kompile/interface/native/interface.c")
                .is_file()
        );
    }

    #[test]
    fn failing_translator_exit_code_is_propagated() {
        let temp = TempDir::new().unwrap();
        let source_dir = create_source_tree(&temp);
        let lib_dir = create_library_dir(&temp);
        let include_dir = create_include_dir(&temp);
        let bin_dir = temp.path().join("bin");
        install_fake_tools(&bin_dir, &temp.path().join("numpy"));
        let failing = write_script(
            &bin_dir,
            "broken-cython",
            "echo 'interface.pyx:1:0: syntax error' >&2\nexit 3\n",
        );
        let out_dir = temp.path().join("wheels");

        let output = kompile_command()
            .args(["build", "--source-dir"])
            .arg(&source_dir)
            .arg("--out-dir")
            .arg(&out_dir)
            .arg("--cython")
            .arg(&failing)
            .args(["--python", "python"])
            .env("PATH", path_with(&bin_dir))
            .env("LIB_OUTPUT_PATH", &lib_dir)
            .env("INCLUDE_PATH", &include_dir)
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(3));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("syntax error"), "stderr: {stderr}");
        assert!(!out_dir.join(WHEEL_NAME).exists());
    }

    #[test]
    fn missing_bridging_source_fails_before_tools() {
        let temp = TempDir::new().unwrap();
        let source_dir = create_source_tree(&temp);
        fs::remove_file(source_dir.join("kompile/interface/native/interface.pyx")).unwrap();
        let lib_dir = create_library_dir(&temp);
        let include_dir = create_include_dir(&temp);
        let bin_dir = temp.path().join("bin");
        let log = install_fake_tools(&bin_dir, &temp.path().join("numpy"));

        let output = kompile_command()
            .args(["build", "--quiet", "--python", "python", "--source-dir"])
            .arg(&source_dir)
            .env("PATH", path_with(&bin_dir))
            .env("LIB_OUTPUT_PATH", &lib_dir)
            .env("INCLUDE_PATH", &include_dir)
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stderr).contains("bridging source not found"));
        assert!(!log.exists());
    }

    #[test]
    fn library_init_replaces_package_init() {
        let temp = TempDir::new().unwrap();
        let source_dir = create_source_tree(&temp);
        let lib_dir = create_library_dir(&temp);
        fs::write(lib_dir.join("__init__.py"), "from .interface import *\n").unwrap();
        let include_dir = create_include_dir(&temp);
        let bin_dir = temp.path().join("bin");
        install_fake_tools(&bin_dir, &temp.path().join("numpy"));
        let out_dir = temp.path().join("wheels");

        let output = kompile_command()
            .args(["build", "--quiet", "--python", "python", "--source-dir"])
            .arg(&source_dir)
            .arg("--out-dir")
            .arg(&out_dir)
            .env("PATH", path_with(&bin_dir))
            .env("LIB_OUTPUT_PATH", &lib_dir)
            .env("INCLUDE_PATH", &include_dir)
            .output()
            .unwrap();

        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        assert!(
            output.stdout.is_empty(),
            "stdout: {}",
            String::from_utf8_lossy(&output.stdout)
        );

        let wheel = out_dir.join(WHEEL_NAME);
        assert_eq!(
            read_entry(&wheel, "kompile/interface/native/__init__.py").unwrap(),
            b"from .interface import *\n"
        );
        for name in ["libkompile_c_library.so", "libkompile-image.so", "extra.dat"] {
            let entry = format!("kompile/interface/native/{name}");
            assert!(read_entry(&wheel, &entry).is_ok(), "{entry} missing");
        }
    }

    #[test]
    fn library_named_like_extension_fails_build() {
        let temp = TempDir::new().unwrap();
        let source_dir = create_source_tree(&temp);
        let lib_dir = create_library_dir(&temp);
        fs::write(lib_dir.join("interface.cpython-39-x86_64-linux-gnu.so"), b"stale").unwrap();
        let include_dir = create_include_dir(&temp);
        let bin_dir = temp.path().join("bin");
        install_fake_tools(&bin_dir, &temp.path().join("numpy"));
        let out_dir = temp.path().join("wheels");

        let output = kompile_command()
            .args(["build", "--quiet", "--python", "python", "--source-dir"])
            .arg(&source_dir)
            .arg("--out-dir")
            .arg(&out_dir)
            .env("PATH", path_with(&bin_dir))
            .env("LIB_OUTPUT_PATH", &lib_dir)
            .env("INCLUDE_PATH", &include_dir)
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(
            stderr.contains("would overwrite the extension module"),
            "stderr: {stderr}"
        );
        assert!(!out_dir.join(WHEEL_NAME).exists());
    }

    #[test]
    fn config_file_selects_tools() {
        let temp = TempDir::new().unwrap();
        let source_dir = create_source_tree(&temp);
        let lib_dir = create_library_dir(&temp);
        let include_dir = create_include_dir(&temp);
        let bin_dir = temp.path().join("bin");
        install_fake_tools(&bin_dir, &temp.path().join("numpy"));
        fs::write(
            source_dir.join("kompile-python.toml"),
            format!(
                "[build]\npython = \"{}\"\ncython = \"{}\"\nout_dir = \"wheelhouse\"\n",
                bin_dir.join("python").display(),
                bin_dir.join("cython").display()
            ),
        )
        .unwrap();

        let output = kompile_command()
            .args(["build", "--quiet", "--source-dir"])
            .arg(&source_dir)
            .env("PATH", path_with(&bin_dir))
            .env("LIB_OUTPUT_PATH", &lib_dir)
            .env("INCLUDE_PATH", &include_dir)
            .output()
            .unwrap();

        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        assert!(source_dir.join("wheelhouse").join(WHEEL_NAME).is_file());
    }
}

#[test]
#[ignore = "Requires python3 with numpy, cython and gcc"]
fn builds_with_real_toolchain() {
    let temp = TempDir::new().unwrap();
    let source_dir = create_source_tree(&temp);
    let lib_dir = create_library_dir(&temp);
    let include_dir = create_include_dir(&temp);

    let output = kompile_command()
        .args(["build", "--verbose", "--source-dir"])
        .arg(&source_dir)
        .env("LIB_OUTPUT_PATH", &lib_dir)
        .env("INCLUDE_PATH", &include_dir)
        .output()
        .unwrap();

    // The fixture libraries are not real shared objects, so the link step
    // fails; translation and compilation must have succeeded before it.
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Running: cython"), "stdout: {stdout}");
    assert!(
        source_dir
            .join("build/temp/kompile/interface/native/interface.o")
            .is_file(),
        "stdout: {stdout}"
    );
    assert!(!output.status.success());
}
