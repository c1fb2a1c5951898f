//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::path::PathBuf;

use linecycle::files::write_lines;
use tempfile::TempDir;

/// `["1", "2", ..., "n"]`
pub fn numbers(n: usize) -> Vec<String> {
    (1..=n).map(|i| i.to_string()).collect()
}

/// `["seeder1", ..., "seedern"]`
pub fn seeders(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("seeder{i}")).collect()
}

/// Write `lines` to `<dir>/<file_name>` and return the path.
pub fn line_file(dir: &TempDir, file_name: &str, lines: &[String]) -> PathBuf {
    let path = dir.path().join(file_name);
    write_lines(&path, lines).expect("write fixture");
    path
}
