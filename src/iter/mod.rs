//! Iterator interface and base cyclic iterators
//!
//! Every iterator in the crate is driven through `&self` so a single instance
//! can be shared between threads behind an `Arc`.

mod slice;
mod stream;

pub use slice::SliceIterator;
pub use stream::StreamIterator;

use std::sync::{Mutex, MutexGuard};

use crate::{Error, Result};

/// A named, finite sequence of lines handed out in blocks.
pub trait LineIterator: Send + Sync {
    /// Stable identifier, used as the registry and checkpoint key.
    fn name(&self) -> &str;

    /// Number of lines in one full cycle.
    fn len(&self) -> usize;

    /// True when the sequence holds no lines at all.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pull the next `count` lines.
    ///
    /// A non-round-robin source that runs out part way returns the shorter
    /// batch; callers must not assume the batch length equals `count`.
    fn next(&self, count: usize) -> Result<Vec<String>>;

    /// Pull a single line.
    fn next_one(&self) -> Result<String> {
        self.next(1)?.pop().ok_or_else(|| Error::Exhausted {
            name: self.name().to_string(),
        })
    }
}

/// An iterator whose position is an explicit cursor.
pub trait PointerIterator: LineIterator {
    /// Index of the next line to read.
    fn pointer(&self) -> u64;

    /// Move the cursor; fails with [`Error::PointerOutOfRange`] past `len()`.
    fn set_pointer(&self, pointer: u64) -> Result<()>;

    /// Skip one line, as a `next(1)` whose result is dropped.
    ///
    /// A non-round-robin iterator already at the end stays there.
    fn inc(&self) -> Result<()>;

    /// Move the cursor back to the first line.
    fn reset_pointer(&self) -> Result<()> {
        self.set_pointer(0)
    }
}

/// Range check shared by both base iterators.
pub(crate) fn check_pointer(name: &str, pointer: u64, len: usize) -> Result<()> {
    if pointer > len as u64 {
        return Err(Error::PointerOutOfRange {
            name: name.to_string(),
            pointer,
            len,
        });
    }
    Ok(())
}

/// Lock, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
