//! Exclusion sets and the blacklisting decorator
//!
//! A [`Blacklist`] is shared between any number of iterators and may grow
//! while they are being pulled from.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::trace;

use crate::files::{read_lines, write_lines};
use crate::iter::{lock, LineIterator, PointerIterator};
use crate::{Error, Result};

/// Concurrency-safe set of excluded values.
#[derive(Debug, Default)]
pub struct Blacklist {
    entries: RwLock<HashSet<String>>,
}

impl Blacklist {
    /// Create an empty blacklist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a blacklist holding `lines`.
    pub fn from_lines<S, I>(lines: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        Self {
            entries: RwLock::new(lines.into_iter().map(Into::into).collect()),
        }
    }

    /// Load a blacklist from a line file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_lines(read_lines(path)?))
    }

    /// Add one value; returns false if it was already present.
    pub fn add(&self, value: impl Into<String>) -> bool {
        self.write().insert(value.into())
    }

    /// Add many values at once.
    pub fn extend<S, I>(&self, values: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        self.write().extend(values.into_iter().map(Into::into));
    }

    /// Remove a value; returns true if it was present.
    pub fn remove(&self, value: &str) -> bool {
        self.write().remove(value)
    }

    /// Membership test.
    pub fn contains(&self, value: &str) -> bool {
        self.read().contains(value)
    }

    /// Number of excluded values.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// True when nothing is excluded.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Sorted copy of the current entries.
    pub fn snapshot(&self) -> Vec<String> {
        let mut entries: Vec<String> = self.read().iter().cloned().collect();
        entries.sort();
        entries
    }

    fn read(&self) -> RwLockReadGuard<'_, HashSet<String>> {
        self.entries.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashSet<String>> {
        self.entries.write().unwrap_or_else(|p| p.into_inner())
    }
}

/// Decorator that never yields blacklisted lines.
///
/// The cursor is the wrapped iterator's; this type keeps no position of its
/// own.
pub struct BlacklistingIterator {
    inner: Box<dyn PointerIterator>,
    blacklist: Arc<Blacklist>,
    // consecutive rejections across every caller, in pull order
    rejected: Mutex<usize>,
}

impl std::fmt::Debug for BlacklistingIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlacklistingIterator")
            .field("name", &self.inner.name())
            .field("blacklisted", &self.blacklist.len())
            .finish()
    }
}

impl BlacklistingIterator {
    /// Wrap `inner`, filtering against the shared `blacklist`.
    pub fn new(inner: Box<dyn PointerIterator>, blacklist: Arc<Blacklist>) -> Self {
        Self {
            inner,
            blacklist,
            rejected: Mutex::new(0),
        }
    }

    /// Whether `line` is currently excluded.
    pub fn is_blacklisted(&self, line: &str) -> bool {
        self.blacklist.contains(line)
    }

    /// Shared exclusion set.
    pub fn blacklist(&self) -> &Arc<Blacklist> {
        &self.blacklist
    }
}

impl LineIterator for BlacklistingIterator {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    /// Always returns exactly `count` clean lines or fails.
    ///
    /// Fails with [`Error::AllBlacklisted`] once a whole cycle's worth of
    /// consecutive lines was rejected. The run is counted over every caller's
    /// pulls, so lines taken by another thread never count against this one.
    fn next(&self, count: usize) -> Result<Vec<String>> {
        let mut clean = Vec::with_capacity(count);
        let cycle = self.inner.len();

        while clean.len() < count {
            let mut rejected = lock(&self.rejected);
            let pulled = self
                .inner
                .next(count - clean.len())
                .map_err(|e| e.within(self.name()))?;

            for line in pulled {
                if self.is_blacklisted(&line) {
                    trace!(name = %self.name(), %line, "skipping blacklisted line");
                    *rejected += 1;
                } else {
                    *rejected = 0;
                    clean.push(line);
                }
            }

            if clean.len() < count && cycle > 0 && *rejected >= cycle {
                // the next call starts a fresh run
                *rejected = 0;
                return Err(Error::AllBlacklisted {
                    name: self.name().to_string(),
                });
            }
        }
        Ok(clean)
    }
}

impl PointerIterator for BlacklistingIterator {
    fn pointer(&self) -> u64 {
        self.inner.pointer()
    }

    fn set_pointer(&self, pointer: u64) -> Result<()> {
        self.inner.set_pointer(pointer)
    }

    fn inc(&self) -> Result<()> {
        self.inner.inc()
    }
}

/// Copy `input` to `output`, dropping blacklisted lines. Returns the number of
/// lines kept.
pub fn scrub_file(
    blacklist: &Blacklist,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<usize> {
    let kept: Vec<String> = read_lines(input)?
        .into_iter()
        .filter(|line| !blacklist.contains(line))
        .collect();
    write_lines(output, &kept)?;
    Ok(kept.len())
}
