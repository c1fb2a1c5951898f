//! Seeding decorator
//!
//! Plants a line from a secondary source at fixed output slots:
//!
//! ```text
//! slot = emitted + planted
//! slot % plant_every == 0  -> next seed
//! otherwise                -> next primary line
//! ```
//!
//! `emitted` counts primary lines this decorator handed out, so wraparound and
//! lines skipped further down the stack never shift the slots. The exposed
//! cursor is the primary one, so checkpoints never count seeds.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::iter::{lock, LineIterator, PointerIterator};
use crate::{Error, Result};

/// Interleaves seeds from a second iterator into the primary stream.
pub struct SeedingIterator {
    inner: Box<dyn PointerIterator>,
    seeds: Box<dyn LineIterator>,
    plant_every: u64,
    planted: AtomicU64,
    emitted: AtomicU64,
    // one batch fills its slots without interleaving with another caller's
    slots: Mutex<()>,
}

impl std::fmt::Debug for SeedingIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedingIterator")
            .field("name", &self.inner.name())
            .field("seeds", &self.seeds.name())
            .field("plant_every", &self.plant_every)
            .field("planted", &self.planted())
            .field("emitted", &self.emitted())
            .finish()
    }
}

impl SeedingIterator {
    /// Plant one line of `seeds` whenever the combined position is a
    /// multiple of `plant_every`.
    ///
    /// `seeds` should be round-robin; an exhausted seed source fails the pull.
    pub fn new(
        inner: Box<dyn PointerIterator>,
        seeds: Box<dyn LineIterator>,
        plant_every: usize,
    ) -> Result<Self> {
        if plant_every == 0 {
            return Err(Error::InvalidPlantInterval {
                name: inner.name().to_string(),
            });
        }
        Ok(Self {
            inner,
            seeds,
            plant_every: plant_every as u64,
            planted: AtomicU64::new(0),
            emitted: AtomicU64::new(0),
            slots: Mutex::new(()),
        })
    }

    /// Source the seeds are drawn from.
    pub fn seeds(&self) -> &dyn LineIterator {
        self.seeds.as_ref()
    }

    /// Interval between planted seeds.
    pub fn plant_every(&self) -> usize {
        self.plant_every as usize
    }

    /// Seeds planted over the iterator's lifetime.
    pub fn planted(&self) -> u64 {
        self.planted.load(Ordering::Acquire)
    }

    /// Primary lines handed out over the iterator's lifetime.
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Acquire)
    }

    fn seed_due(&self) -> bool {
        (self.emitted() + self.planted()) % self.plant_every == 0
    }
}

impl LineIterator for SeedingIterator {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn next(&self, count: usize) -> Result<Vec<String>> {
        let _guard = lock(&self.slots);
        let mut batch = Vec::with_capacity(count);
        for _ in 0..count {
            if self.seed_due() {
                let seed = self.seeds.next_one().map_err(|e| e.within(self.name()))?;
                self.planted.fetch_add(1, Ordering::AcqRel);
                batch.push(seed);
                continue;
            }

            match self.inner.next(1) {
                Ok(lines) => {
                    self.emitted.fetch_add(lines.len() as u64, Ordering::AcqRel);
                    batch.extend(lines);
                }
                Err(_) if !batch.is_empty() => return Ok(batch),
                Err(e) => return Err(e.within(self.name())),
            }
        }
        Ok(batch)
    }
}

impl PointerIterator for SeedingIterator {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::SliceIterator;

    fn numbers() -> Box<dyn PointerIterator> {
        Box::new(SliceIterator::new(
            "numbers",
            (1..=10).map(|n| n.to_string()),
            false,
        ))
    }

    fn seeds() -> Box<dyn LineIterator> {
        Box::new(SliceIterator::new(
            "seeds",
            (1..=10).map(|n| format!("seeder{n}")),
            true,
        ))
    }

    #[test]
    fn test_plants_every_second_slot() {
        let iter = SeedingIterator::new(numbers(), seeds(), 2).unwrap();
        let batch = iter.next(6).unwrap();
        assert_eq!(batch, vec!["seeder1", "1", "seeder2", "2", "seeder3", "3"]);
        assert_eq!(iter.planted(), 3);
        assert_eq!(iter.pointer(), 3);
    }

    #[test]
    fn test_interval_spans_calls() {
        let iter = SeedingIterator::new(numbers(), seeds(), 3).unwrap();
        let mut combined = iter.next(2).unwrap();
        combined.extend(iter.next(4).unwrap());
        assert_eq!(combined, vec!["seeder1", "1", "2", "seeder2", "3", "4"]);
    }

    #[test]
    fn test_interval_of_one_plants_only_seeds() {
        let iter = SeedingIterator::new(numbers(), seeds(), 1).unwrap();
        assert_eq!(iter.next(3).unwrap(), vec!["seeder1", "seeder2", "seeder3"]);
        assert_eq!(iter.pointer(), 0);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = SeedingIterator::new(numbers(), seeds(), 0).unwrap_err();
        assert!(matches!(err, Error::InvalidPlantInterval { .. }));
    }

    #[test]
    fn test_short_batch_when_primary_runs_out() {
        let iter = SeedingIterator::new(numbers(), seeds(), 2).unwrap();
        iter.set_pointer(9).unwrap();
        // slot 3 wants the primary, which has nothing left
        assert_eq!(iter.next(5).unwrap(), vec!["seeder1", "10", "seeder2"]);
        assert!(iter.next(1).unwrap_err().is_exhausted());
    }

    #[test]
    fn test_exhausted_primary_with_empty_batch_fails() {
        let iter = SeedingIterator::new(numbers(), seeds(), 2).unwrap();
        iter.set_pointer(10).unwrap();
        // slot 0 is always a seed
        assert_eq!(iter.next_one().unwrap(), "seeder1");
        let err = iter.next(1).unwrap_err();
        assert!(err.is_exhausted());
    }

    #[test]
    fn test_slots_hold_across_primary_wraparound() {
        let primary = Box::new(SliceIterator::new("letters", ["a", "b", "c"], true));
        let iter = SeedingIterator::new(primary, seeds(), 2).unwrap();
        let batch = iter.next(12).unwrap();
        for (slot, line) in batch.iter().enumerate() {
            assert_eq!(line.starts_with("seeder"), slot % 2 == 0, "slot {slot}: {line}");
        }
        assert_eq!(
            batch.iter().filter(|l| !l.starts_with("seeder")).collect::<Vec<_>>(),
            vec!["a", "b", "c", "a", "b", "c"]
        );
        assert_eq!(iter.emitted(), 6);
        assert_eq!(iter.pointer(), 3);
    }

    #[test]
    fn test_slots_ignore_lines_skipped_below() {
        use crate::blacklist::{Blacklist, BlacklistingIterator};
        use std::sync::Arc;

        let filtered = Box::new(BlacklistingIterator::new(
            numbers(),
            Arc::new(Blacklist::from_lines(["2"])),
        ));
        let iter = SeedingIterator::new(filtered, seeds(), 2).unwrap();
        assert_eq!(
            iter.next(8).unwrap(),
            vec!["seeder1", "1", "seeder2", "3", "seeder3", "4", "seeder4", "5"]
        );
        // the cursor still counts the skipped line
        assert_eq!(iter.pointer(), 5);
        assert_eq!(iter.emitted(), 4);
    }
}
