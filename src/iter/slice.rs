use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::{check_pointer, lock, LineIterator, PointerIterator};
use crate::{Error, Result};

/// In-memory iterator over an owned list of lines.
///
/// The cursor is atomic so [`PointerIterator::pointer`] never blocks, while
/// every fetch-and-advance happens under one mutex so concurrent pulls never
/// see the same index twice.
#[derive(Debug)]
pub struct SliceIterator {
    name: String,
    lines: Vec<String>,
    pointer: AtomicU64,
    round_robin: bool,
    advance: Mutex<()>,
}

impl SliceIterator {
    /// Create an iterator over `lines`, starting at the first line.
    pub fn new<S, I>(name: impl Into<String>, lines: I, round_robin: bool) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        Self {
            name: name.into(),
            lines: lines.into_iter().map(Into::into).collect(),
            pointer: AtomicU64::new(0),
            round_robin,
            advance: Mutex::new(()),
        }
    }

    /// Backing lines in cycle order.
    pub fn lines(&self) -> &[String] {
        &self.lines
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
}

impl LineIterator for SliceIterator {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.lines.len()
    }

    fn next(&self, count: usize) -> Result<Vec<String>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if self.lines.is_empty() {
            return Err(self.exhausted());
        }

        let _guard = lock(&self.advance);
        let mut batch = Vec::with_capacity(count);
        for _ in 0..count {
            let ptr = self.pointer.load(Ordering::Acquire) as usize;
            if ptr >= self.lines.len() {
                if !self.round_robin {
                    if batch.is_empty() {
                        return Err(self.exhausted());
                    }
                    return Ok(batch);
                }
                // index 0 is consumed right here
                batch.push(self.lines[0].clone());
                self.pointer.store(1, Ordering::Release);
            } else {
                batch.push(self.lines[ptr].clone());
                self.pointer.fetch_add(1, Ordering::AcqRel);
            }
        }
        Ok(batch)
    }
}

impl PointerIterator for SliceIterator {
    fn pointer(&self) -> u64 {
        self.pointer.load(Ordering::Acquire)
    }

    fn set_pointer(&self, pointer: u64) -> Result<()> {
        check_pointer(&self.name, pointer, self.lines.len())?;
        let _guard = lock(&self.advance);
        self.pointer.store(pointer, Ordering::Release);
        Ok(())
    }

    fn inc(&self) -> Result<()> {
        let _guard = lock(&self.advance);
        let ptr = self.pointer.load(Ordering::Acquire) as usize;
        if ptr < self.lines.len() {
            self.pointer.fetch_add(1, Ordering::AcqRel);
        } else if self.round_robin && !self.lines.is_empty() {
            self.pointer.store(1, Ordering::Release);
        }
        Ok(())
    }
}
