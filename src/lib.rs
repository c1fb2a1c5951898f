//! # Cursor-based cyclic line iteration
//!
//! This library hands out batches of lines from ordered collections (an
//! in-memory list or a line-oriented file) through a shared cursor that many
//! threads may pull from at once.
//!
//! ## Iterator stack
//!
//! 1. **Base iterators**: [`SliceIterator`] (in memory) and [`StreamIterator`]
//!    (file backed), optionally wrapping around forever (round-robin)
//! 2. **Blacklisting**: [`BlacklistingIterator`] drops members of a shared
//!    exclusion set
//! 3. **Seeding**: [`SeedingIterator`] plants an item from a second source
//!    every `n` output slots
//! 4. **Persistence**: [`PersistentIterator`] restores and checkpoints the
//!    cursor through a [`Persister`]
//!
//! Composition order is always base → blacklist → seed → persist, so the
//! checkpointed cursor counts primary lines only.
//!
//! ## Usage Example
//!
//! ```
//! use linecycle::{IteratorBuilder, LineIterator};
//!
//! let numbers: Vec<String> = (1..=10).map(|n| n.to_string()).collect();
//! let iter = IteratorBuilder::new()
//!     .slice("numbers", numbers, false)
//!     .build()?;
//! assert_eq!(iter.next(3)?, vec!["1", "2", "3"]);
//! # Ok::<(), linecycle::Error>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod blacklist; // Shared exclusion set and filtering decorator
pub mod builder; // Fluent stack assembly
pub mod files; // Bulk line-file helpers
pub mod iter; // Interface traits and base iterators
pub mod persist; // Checkpoint stores and checkpointing decorator
pub mod registry; // Name -> iterator lookup
pub mod seed; // Interleaving decorator

// Re-exports for convenience
pub use blacklist::{scrub_file, Blacklist, BlacklistingIterator};
pub use builder::{IteratorBuilder, Seeds, SEEDS_NAME};
pub use iter::{LineIterator, PointerIterator, SliceIterator, StreamIterator};
pub use persist::{FilePersister, MemoryPersister, PersistentIterator, Persister};
pub use registry::{Registry, DEFAULT_MAX_LINES_FOR_SLICE};
pub use seed::SeedingIterator;

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while pulling from or configuring an iterator stack
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A non-round-robin source has no lines left (or never had any).
    #[error("{name}: no more lines")]
    Exhausted {
        /// Name of the exhausted iterator.
        name: String,
    },

    /// Checkpoint store has no value for the key.
    #[error("checkpoint not found for key {key}")]
    NotFound {
        /// Key that was looked up.
        key: String,
    },

    /// Underlying file operation failed.
    #[error("{context}: {source}")]
    Io {
        /// What was being done, usually including the path.
        context: String,
        /// Originating I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Requested cursor lies past the end of the sequence.
    #[error("{name}: pointer {pointer} out of range (len {len})")]
    PointerOutOfRange {
        /// Iterator name.
        name: String,
        /// Requested cursor.
        pointer: u64,
        /// Sequence length.
        len: usize,
    },

    /// A full cycle of the wrapped sequence produced only blacklisted lines.
    #[error("{name}: every line is blacklisted")]
    AllBlacklisted {
        /// Iterator name.
        name: String,
    },

    /// Seeding interval must be at least one.
    #[error("{name}: plant interval must be greater than zero")]
    InvalidPlantInterval {
        /// Iterator name.
        name: String,
    },

    /// Registry has no iterator under this name.
    #[error("unknown iterator: {name}")]
    UnknownIterator {
        /// Requested name.
        name: String,
    },

    /// Checkpoint file could not be decoded or encoded.
    #[error("checkpoint store {}: {message}", .path.display())]
    Store {
        /// Path of the checkpoint file.
        path: PathBuf,
        /// Decoder/encoder message.
        message: String,
    },

    /// Builder was asked to build without a base iterator.
    #[error("builder: {0}")]
    Builder(String),

    /// Error from a wrapped iterator, tagged with the decorator's name.
    #[error("{name}: {source}")]
    Context {
        /// Name of the decorator that observed the failure.
        name: String,
        /// Failure of the wrapped iterator.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Helper for constructing I/O errors with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    /// Wrap `self` with the name of the decorator reporting it.
    pub fn within(self, name: impl Into<String>) -> Self {
        Error::Context {
            name: name.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping every [`Error::Context`] layer.
    pub fn root(&self) -> &Error {
        let mut current = self;
        while let Error::Context { source, .. } = current {
            current = source.as_ref();
        }
        current
    }

    /// True when the root cause is [`Error::Exhausted`].
    pub fn is_exhausted(&self) -> bool {
        matches!(self.root(), Error::Exhausted { .. })
    }

    /// True when the root cause is [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Error::NotFound { .. })
    }
}
