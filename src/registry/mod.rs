//! Name → iterator lookup

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::files::{count_lines, list_files, name_from_path, read_lines};
use crate::iter::{LineIterator, PointerIterator, SliceIterator, StreamIterator};
use crate::{Error, Result};

/// Files with more lines than this are streamed instead of loaded.
pub const DEFAULT_MAX_LINES_FOR_SLICE: usize = 250_000;

/// Registry storing iterators by name.
#[derive(Default)]
pub struct Registry {
    iterators: HashMap<String, Arc<dyn PointerIterator>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.names())
            .finish()
    }
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            iterators: HashMap::new(),
        }
    }

    /// Register an iterator under its own name, replacing any previous entry,
    /// and return a shared handle to it.
    pub fn add<I>(&mut self, iterator: I) -> Arc<dyn PointerIterator>
    where
        I: PointerIterator + 'static,
    {
        self.add_shared(Arc::new(iterator))
    }

    /// Register an already shared iterator.
    pub fn add_shared(&mut self, iterator: Arc<dyn PointerIterator>) -> Arc<dyn PointerIterator> {
        self.iterators
            .insert(iterator.name().to_string(), Arc::clone(&iterator));
        iterator
    }

    /// Register several shared iterators.
    pub fn add_all<I>(&mut self, iterators: I) -> &mut Self
    where
        I: IntoIterator<Item = Arc<dyn PointerIterator>>,
    {
        for iterator in iterators {
            self.add_shared(iterator);
        }
        self
    }

    /// Look up an iterator by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn PointerIterator>> {
        self.iterators
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownIterator {
                name: name.to_string(),
            })
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.iterators.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered iterators.
    pub fn len(&self) -> usize {
        self.iterators.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.iterators.is_empty()
    }

    /// Load every file of `dir` into memory as a [`SliceIterator`].
    pub fn add_dir(&mut self, dir: impl AsRef<Path>, round_robin: bool) -> Result<usize> {
        let files = list_files(&dir)?;
        info!(dir = %dir.as_ref().display(), files = files.len(), "loading iterators");
        for file in &files {
            let name = name_from_path(file);
            let lines = read_lines(file)?;
            debug!(%name, lines = lines.len(), "slice iterator");
            self.add(SliceIterator::new(name, lines, round_robin));
        }
        Ok(files.len())
    }

    /// Like [`Registry::add_dir`], but files longer than
    /// `max_lines_for_slice` become [`StreamIterator`]s.
    pub fn smart_add_dir(
        &mut self,
        dir: impl AsRef<Path>,
        round_robin: bool,
        max_lines_for_slice: usize,
    ) -> Result<usize> {
        let files = list_files(&dir)?;
        info!(dir = %dir.as_ref().display(), files = files.len(), "loading iterators");
        for file in &files {
            let lines = count_lines(file)?;
            if lines > max_lines_for_slice {
                let stream = StreamIterator::open(file, round_robin)?;
                debug!(name = %stream.name(), lines, "stream iterator");
                self.add(stream);
            } else {
                let name = name_from_path(file);
                debug!(%name, lines, "slice iterator");
                self.add(SliceIterator::new(name, read_lines(file)?, round_robin));
            }
        }
        Ok(files.len())
    }
}
