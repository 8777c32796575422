//! Wheel `RECORD` file
//!
//! One CSV line per archive entry: path, `sha256=` digest in unpadded
//! URL-safe base64, and size in bytes. `RECORD` lists itself with the last
//! two columns empty.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// One line of `RECORD`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    /// Path inside the wheel
    pub path: String,
    /// `sha256=...`, absent for `RECORD` itself
    pub hash: Option<String>,
    /// Size in bytes, absent for `RECORD` itself
    pub size: Option<u64>,
}

impl RecordEntry {
    /// Entry for `contents` stored at `path`.
    #[must_use]
    pub fn for_contents(path: &str, contents: &[u8]) -> Self {
        Self {
            path: path.to_string(),
            hash: Some(digest(contents)),
            size: Some(contents.len() as u64),
        }
    }

    /// Entry for the `RECORD` file itself.
    #[must_use]
    pub fn unhashed(path: &str) -> Self {
        Self {
            path: path.to_string(),
            hash: None,
            size: None,
        }
    }
}

/// `sha256=<digest>` as used in `RECORD`.
#[must_use]
pub fn digest(contents: &[u8]) -> String {
    let hash = Sha256::digest(contents);
    format!("sha256={}", URL_SAFE_NO_PAD.encode(hash))
}

/// Render `entries` as `RECORD` file contents.
#[must_use]
pub fn render(entries: &[RecordEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "{},{},{}",
            csv_field(&entry.path),
            entry.hash.as_deref().unwrap_or_default(),
            entry.size.map_or_else(String::new, |size| size.to_string())
        );
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
