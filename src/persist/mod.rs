//! Cursor checkpointing
//!
//! A [`PersistentIterator`] restores its cursor from a [`Persister`] on
//! construction and writes it back after every successful pull.

mod file;

pub use file::FilePersister;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use crate::iter::{lock, LineIterator, PointerIterator};
use crate::{Error, Result};

/// Key/value store for cursors, keyed by iterator name.
///
/// Implementations serialize their own writes; one store may back many
/// iterators.
pub trait Persister: Send + Sync {
    /// Stored cursor for `key`, or [`Error::NotFound`].
    fn get(&self, key: &str) -> Result<u64>;

    /// Durably record `value` for `key`.
    fn set(&self, key: &str, value: u64) -> Result<()>;
}

/// Process-local store, useful for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryPersister {
    pointers: Mutex<HashMap<String, u64>>,
}

impl MemoryPersister {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persister for MemoryPersister {
    fn get(&self, key: &str) -> Result<u64> {
        lock(&self.pointers)
            .get(key)
            .copied()
            .ok_or_else(|| Error::NotFound {
                key: key.to_string(),
            })
    }

    fn set(&self, key: &str, value: u64) -> Result<()> {
        lock(&self.pointers).insert(key.to_string(), value);
        Ok(())
    }
}

/// Decorator that checkpoints the wrapped cursor.
///
/// A failed checkpoint write fails the whole pull even though the wrapped
/// cursor already moved; those lines were delivered at most once but are not
/// durable.
pub struct PersistentIterator {
    inner: Box<dyn PointerIterator>,
    persister: Arc<dyn Persister>,
    // held while reading and writing the cursor so the last write is the newest
    checkpoint: Mutex<()>,
}

impl std::fmt::Debug for PersistentIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentIterator")
            .field("name", &self.inner.name())
            .field("pointer", &self.inner.pointer())
            .finish()
    }
}

impl PersistentIterator {
    /// Wrap `inner`, restoring its cursor from `persister` when a checkpoint
    /// exists under its name.
    pub fn new(inner: Box<dyn PointerIterator>, persister: Arc<dyn Persister>) -> Result<Self> {
        match persister.get(inner.name()) {
            Ok(pointer) => {
                inner
                    .set_pointer(pointer)
                    .map_err(|e| e.within(inner.name()))?;
                debug!(name = %inner.name(), pointer, "restored checkpoint");
            }
            Err(e) if e.is_not_found() => {
                debug!(name = %inner.name(), "no checkpoint, starting at 0");
            }
            Err(e) => return Err(e.within(inner.name())),
        }
        Ok(Self {
            inner,
            persister,
            checkpoint: Mutex::new(()),
        })
    }

    /// Store backing this iterator.
    pub fn persister(&self) -> &Arc<dyn Persister> {
        &self.persister
    }

    fn checkpoint(&self) -> Result<()> {
        let _guard = lock(&self.checkpoint);
        let pointer = self.inner.pointer();
        self.persister
            .set(self.name(), pointer)
            .map_err(|e| e.within(self.name()))?;
        trace!(name = %self.name(), pointer, "checkpoint written");
        Ok(())
    }
}

impl LineIterator for PersistentIterator {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn next(&self, count: usize) -> Result<Vec<String>> {
        let batch = self
            .inner
            .next(count)
            .map_err(|e| e.within(self.name()))?;
        self.checkpoint()?;
        Ok(batch)
    }
}

impl PointerIterator for PersistentIterator {
    fn pointer(&self) -> u64 {
        self.inner.pointer()
    }

    /// Moves the wrapped cursor and checkpoints it immediately.
    fn set_pointer(&self, pointer: u64) -> Result<()> {
        self.inner.set_pointer(pointer)?;
        self.checkpoint()
    }

    fn inc(&self) -> Result<()> {
        self.inner.inc()?;
        self.checkpoint()
    }
}
