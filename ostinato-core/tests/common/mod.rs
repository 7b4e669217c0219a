#![allow(dead_code)]
//! Shared helpers for ostinato-core integration tests.

use std::io::Write;
use std::path::PathBuf;

use tempfile::TempDir;

/// Write `contents` to `config.toml` inside a fresh temp dir.
/// Keep the returned dir alive for as long as the path is used.
pub fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    (dir, path)
}
