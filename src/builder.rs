//! Fluent assembly of iterator stacks
//!
//! The builder only records what to construct; files are opened and
//! checkpoints read in [`IteratorBuilder::build`], which always composes
//! base → blacklist → seed → persist.

use std::path::PathBuf;
use std::sync::Arc;

use crate::blacklist::{Blacklist, BlacklistingIterator};
use crate::iter::{LineIterator, PointerIterator, SliceIterator, StreamIterator};
use crate::persist::{PersistentIterator, Persister};
use crate::seed::SeedingIterator;
use crate::{Error, Result};

/// Name given to seed sources built from a line list.
pub const SEEDS_NAME: &str = "seeds";

/// Where planted seeds come from. Seed sources are always round-robin.
#[derive(Debug, Clone)]
pub enum Seeds {
    /// In-memory seed list, named [`SEEDS_NAME`].
    Lines(Vec<String>),
    /// Seed file, streamed and named after its file stem.
    File(PathBuf),
}

#[derive(Debug)]
enum Base {
    Slice {
        name: String,
        lines: Vec<String>,
        round_robin: bool,
    },
    Stream {
        name: Option<String>,
        path: PathBuf,
        round_robin: bool,
    },
}

/// Builder for iterator stacks (fluent API)
pub struct IteratorBuilder {
    base: Option<Base>,
    blacklist: Option<Arc<Blacklist>>,
    seeds: Option<(usize, Seeds)>,
    persister: Option<Arc<dyn Persister>>,
}

impl std::fmt::Debug for IteratorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IteratorBuilder")
            .field("base", &self.base)
            .field("blacklist", &self.blacklist.as_ref().map(|b| b.len()))
            .field("seeds", &self.seeds)
            .field("persist", &self.persister.is_some())
            .finish()
    }
}

impl Default for IteratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IteratorBuilder {
    /// Create new builder
    pub fn new() -> Self {
        Self {
            base: None,
            blacklist: None,
            seeds: None,
            persister: None,
        }
    }

    /// Use an in-memory list as the base iterator
    pub fn slice<S, I>(mut self, name: impl Into<String>, lines: I, round_robin: bool) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        self.base = Some(Base::Slice {
            name: name.into(),
            lines: lines.into_iter().map(Into::into).collect(),
            round_robin,
        });
        self
    }

    /// Stream a file as the base iterator, named after its file stem
    pub fn stream(mut self, path: impl Into<PathBuf>, round_robin: bool) -> Self {
        self.base = Some(Base::Stream {
            name: None,
            path: path.into(),
            round_robin,
        });
        self
    }

    /// Stream a file as the base iterator under an explicit name
    pub fn stream_named(
        mut self,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        round_robin: bool,
    ) -> Self {
        self.base = Some(Base::Stream {
            name: Some(name.into()),
            path: path.into(),
            round_robin,
        });
        self
    }

    /// Filter against a shared blacklist
    pub fn blacklist(mut self, blacklist: Arc<Blacklist>) -> Self {
        self.blacklist = Some(blacklist);
        self
    }

    /// Plant a seed every `every` output slots
    pub fn seeds(mut self, every: usize, seeds: Seeds) -> Self {
        self.seeds = Some((every, seeds));
        self
    }

    /// Checkpoint the cursor to `persister`
    pub fn persist_to(mut self, persister: Arc<dyn Persister>) -> Self {
        self.persister = Some(persister);
        self
    }

    /// Build the iterator stack
    pub fn build(self) -> Result<Box<dyn PointerIterator>> {
        let base = self
            .base
            .ok_or_else(|| Error::Builder("no base iterator set".to_string()))?;

        let mut iter: Box<dyn PointerIterator> = match base {
            Base::Slice {
                name,
                lines,
                round_robin,
            } => Box::new(SliceIterator::new(name, lines, round_robin)),
            Base::Stream {
                name: Some(name),
                path,
                round_robin,
            } => Box::new(StreamIterator::with_name(name, path, round_robin)?),
            Base::Stream {
                name: None,
                path,
                round_robin,
            } => Box::new(StreamIterator::open(path, round_robin)?),
        };

        if let Some(blacklist) = self.blacklist {
            iter = Box::new(BlacklistingIterator::new(iter, blacklist));
        }

        if let Some((every, seeds)) = self.seeds {
            let source: Box<dyn LineIterator> = match seeds {
                Seeds::Lines(lines) => Box::new(SliceIterator::new(SEEDS_NAME, lines, true)),
                Seeds::File(path) => Box::new(StreamIterator::open(path, true)?),
            };
            iter = Box::new(SeedingIterator::new(iter, source, every)?);
        }

        if let Some(persister) = self.persister {
            iter = Box::new(PersistentIterator::new(iter, persister)?);
        }

        Ok(iter)
    }
}
