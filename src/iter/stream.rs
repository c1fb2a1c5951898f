use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tracing::debug;

use super::{check_pointer, lock, LineIterator, PointerIterator};
use crate::files::{count_lines, name_from_path};
use crate::{Error, Result};

/// File-backed iterator reading lines through a forward-only buffered stream.
///
/// The logical cursor is tracked next to the stream. Repositioning means
/// reopening the file and discarding lines, so [`PointerIterator::set_pointer`]
/// costs O(p).
#[derive(Debug)]
pub struct StreamIterator {
    name: String,
    path: PathBuf,
    line_count: usize,
    round_robin: bool,
    pointer: AtomicU64,
    reader: Mutex<BufReader<File>>,
}

impl StreamIterator {
    /// Open `path`, naming the iterator after the file stem.
    pub fn open(path: impl AsRef<Path>, round_robin: bool) -> Result<Self> {
        let path = path.as_ref();
        Self::with_name(name_from_path(path), path, round_robin)
    }

    /// Open `path` under an explicit name.
    pub fn with_name(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        round_robin: bool,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let line_count = count_lines(&path)?;
        let reader = open_reader(&path)?;
        Ok(Self {
            name: name.into(),
            path,
            line_count,
            round_robin,
            pointer: AtomicU64::new(0),
            reader: Mutex::new(reader),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the iterator wraps around at the end.
    pub fn round_robin(&self) -> bool {
        self.round_robin
    }

    fn exhausted(&self) -> Error {
        Error::Exhausted {
            name: self.name.clone(),
        }
    }

    /// Read one line into `buf` and advance the cursor, reopening the file on
    /// wraparound. `false` means a single-pass stream is at its end.
    fn read_next(&self, reader: &mut BufReader<File>, buf: &mut String) -> Result<bool> {
        buf.clear();
        let read = reader
            .read_line(buf)
            .map_err(|e| Error::io(format!("read {}", self.path.display()), e))?;
        if read == 0 {
            if !self.round_robin {
                return Ok(false);
            }

            debug!(name = %self.name, path = %self.path.display(), "rewinding stream");
            *reader = open_reader(&self.path)?;
            self.pointer.store(0, Ordering::Release);
            let reread = reader
                .read_line(buf)
                .map_err(|e| Error::io(format!("reread {}", self.path.display()), e))?;
            if reread == 0 {
                return Err(Error::io(
                    format!("reread {}", self.path.display()),
                    std::io::ErrorKind::UnexpectedEof.into(),
                ));
            }
        }
        self.pointer.fetch_add(1, Ordering::AcqRel);
        Ok(true)
    }
}

impl LineIterator for StreamIterator {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.line_count
    }

    fn next(&self, count: usize) -> Result<Vec<String>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if self.line_count == 0 {
            return Err(self.exhausted());
        }

        let mut reader = lock(&self.reader);
        let mut batch = Vec::with_capacity(count);
        let mut buf = String::new();
        for _ in 0..count {
            if !self.read_next(&mut reader, &mut buf)? {
                if batch.is_empty() {
                    return Err(self.exhausted());
                }
                return Ok(batch);
            }
            batch.push(buf.trim().to_string());
        }
        Ok(batch)
    }
}

impl PointerIterator for StreamIterator {
    fn pointer(&self) -> u64 {
        self.pointer.load(Ordering::Acquire)
    }

    fn set_pointer(&self, pointer: u64) -> Result<()> {
        check_pointer(&self.name, pointer, self.line_count)?;

        let mut reader = lock(&self.reader);
        let mut fresh = open_reader(&self.path)?;
        let mut discard = String::new();
        for _ in 0..pointer {
            discard.clear();
            fresh
                .read_line(&mut discard)
                .map_err(|e| Error::io(format!("skip {}", self.path.display()), e))?;
        }
        *reader = fresh;
        self.pointer.store(pointer, Ordering::Release);
        debug!(name = %self.name, pointer, "stream repositioned");
        Ok(())
    }

    /// Reads and discards one line so the stream stays in step with the cursor.
    fn inc(&self) -> Result<()> {
        if self.line_count == 0 {
            return Ok(());
        }
        let mut reader = lock(&self.reader);
        let mut discard = String::new();
        self.read_next(&mut reader, &mut discard)?;
        Ok(())
    }
}

fn open_reader(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| Error::io(format!("open {}", path.display()), e))?;
    Ok(BufReader::new(file))
}
