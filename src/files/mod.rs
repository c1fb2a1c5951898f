//! Bulk helpers for line-oriented files
//!
//! These back the base iterators (`count_lines`, `read_lines`) and the
//! registry/CLI tooling around them.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;

use crate::{Error, Result};

/// Read every line of `path`, trimming surrounding whitespace.
pub fn read_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let reader = open(path)?;
    reader
        .lines()
        .map(|line| {
            line.map(|l| l.trim().to_string())
                .map_err(|e| Error::io(format!("read {}", path.display()), e))
        })
        .collect()
}

/// Read `path` into a set of distinct trimmed lines.
pub fn read_to_set(path: impl AsRef<Path>) -> Result<HashSet<String>> {
    Ok(read_lines(path)?.into_iter().collect())
}

/// Count the lines of `path` with a full scan.
pub fn count_lines(path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let mut reader = open(path)?;
    let mut count = 0;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| Error::io(format!("count {}", path.display()), e))?;
        if read == 0 {
            return Ok(count);
        }
        count += 1;
    }
}

/// Write `lines` to `path`, one per line, replacing any existing file.
pub fn write_lines<S: AsRef<str>>(path: impl AsRef<Path>, lines: &[S]) -> Result<()> {
    let path = path.as_ref();
    let context = || format!("write {}", path.display());
    let file = File::create(path).map_err(|e| Error::io(context(), e))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{}", line.as_ref()).map_err(|e| Error::io(context(), e))?;
    }
    writer.flush().map_err(|e| Error::io(context(), e))
}

/// Return a shuffled copy of `lines`.
pub fn shuffle(lines: &[String]) -> Vec<String> {
    let mut shuffled = lines.to_vec();
    shuffled.shuffle(&mut rand::thread_rng());
    shuffled
}

/// Values that occur more than once, each reported once in first-seen order.
pub fn duplicate_lines(lines: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();
    for line in lines {
        if !seen.insert(line.as_str()) && reported.insert(line.as_str()) {
            duplicates.push(line.clone());
        }
    }
    duplicates
}

/// Iterator name for a file: the file name up to its first `.`.
pub fn name_from_path(path: impl AsRef<Path>) -> String {
    let file_name = path
        .as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.split_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => file_name,
    }
}

/// Regular files directly inside `dir`, sorted by path.
pub fn list_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let context = || format!("read dir {}", dir.display());
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(context(), e))? {
        let entry = entry.map_err(|e| Error::io(context(), e))?;
        let file_type = entry.file_type().map_err(|e| Error::io(context(), e))?;
        if file_type.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| Error::io(format!("open {}", path.display()), e))?;
    Ok(BufReader::new(file))
}
