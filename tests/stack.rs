//! Testable properties of the iterator stack, end to end

mod common;

use std::sync::Arc;

use common::{line_file, numbers, seeders};
use linecycle::{
    Blacklist, BlacklistingIterator, Error, IteratorBuilder, LineIterator, MemoryPersister,
    PersistentIterator, Persister, PointerIterator, SeedingIterator, Seeds, SliceIterator,
    StreamIterator,
};
use tempfile::TempDir;
use test_case::test_case;

fn slice(round_robin: bool) -> Box<dyn PointerIterator> {
    Box::new(SliceIterator::new("numbers", numbers(10), round_robin))
}

fn stream(dir: &TempDir, round_robin: bool) -> Box<dyn PointerIterator> {
    let path = line_file(dir, "numbers.txt", &numbers(10));
    Box::new(StreamIterator::open(path, round_robin).unwrap())
}

#[test_case(false ; "slice")]
#[test_case(true ; "stream")]
fn round_robin_full_cycle_is_idempotent(use_stream: bool) {
    let dir = TempDir::new().unwrap();
    let iter = if use_stream { stream(&dir, true) } else { slice(true) };
    let first = iter.next(10).unwrap();
    let second = iter.next(10).unwrap();
    assert_eq!(first, numbers(10));
    assert_eq!(first, second);
}

#[test_case(false ; "slice")]
#[test_case(true ; "stream")]
fn exhaustion_boundary(use_stream: bool) {
    let dir = TempDir::new().unwrap();
    let iter = if use_stream { stream(&dir, false) } else { slice(false) };
    assert_eq!(iter.next(10).unwrap().len(), 10);
    let err = iter.next(1).unwrap_err();
    assert!(matches!(err, Error::Exhausted { ref name } if name == "numbers"));
}

#[test_case(false, false ; "slice single pass")]
#[test_case(true, false ; "stream single pass")]
#[test_case(false, true ; "slice round robin")]
#[test_case(true, true ; "stream round robin")]
fn inc_skips_exactly_one_line(use_stream: bool, round_robin: bool) {
    let dir = TempDir::new().unwrap();
    let iter = if use_stream { stream(&dir, round_robin) } else { slice(round_robin) };

    iter.inc().unwrap();
    assert_eq!(iter.pointer(), 1);
    assert_eq!(iter.next(1).unwrap(), vec!["2"]);
    assert_eq!(iter.pointer(), 2);

    iter.set_pointer(10).unwrap();
    iter.inc().unwrap();
    if round_robin {
        assert_eq!(iter.pointer(), 1);
        assert_eq!(iter.next(1).unwrap(), vec!["2"]);
    } else {
        assert_eq!(iter.pointer(), 10);
        assert!(iter.next(1).unwrap_err().is_exhausted());
    }
}

#[test_case(&["2", "4", "6", "8", "10"], &["1", "3", "5", "7", "9"] ; "evens")]
#[test_case(&["1", "2", "3", "4", "5"], &["6", "7", "8", "9", "10"] ; "leading half")]
fn blacklist_returns_full_batches(blacklisted: &[&str], expected: &[&str]) {
    let blacklist = Arc::new(Blacklist::from_lines(blacklisted.iter().copied()));
    let iter = BlacklistingIterator::new(slice(false), blacklist);
    assert_eq!(iter.next(5).unwrap(), expected);
}

#[test]
fn blacklist_over_stream() {
    let dir = TempDir::new().unwrap();
    let blacklist = Arc::new(Blacklist::from_lines(["1", "10"]));
    let iter = BlacklistingIterator::new(stream(&dir, true), blacklist);
    let batch = iter.next(16).unwrap();
    assert_eq!(batch[..8], numbers(9)[1..]);
    assert_eq!(batch[8..], numbers(9)[1..]);
}

#[test]
fn fully_blacklisted_source_fails_instead_of_looping() {
    let blacklist = Arc::new(Blacklist::from_lines(numbers(10)));
    let iter = BlacklistingIterator::new(slice(true), blacklist);
    let err = iter.next(1).unwrap_err();
    assert!(matches!(err, Error::AllBlacklisted { .. }));
}

#[test]
fn seeding_interleaves_at_interval() {
    let seeds = Box::new(SliceIterator::new("seeds", seeders(10), true));
    let iter = SeedingIterator::new(slice(false), seeds, 2).unwrap();
    assert_eq!(
        iter.next(6).unwrap(),
        vec!["seeder1", "1", "seeder2", "2", "seeder3", "3"]
    );
    assert_eq!(iter.plant_every(), 2);
    assert_eq!(iter.planted(), 3);
    assert_eq!(iter.seeds().name(), "seeds");
}

#[test]
fn checkpoint_resume_starts_at_stored_position() {
    let store = Arc::new(MemoryPersister::new());
    store.set("numbers", 2).unwrap();

    let iter = PersistentIterator::new(slice(false), store.clone()).unwrap();
    assert_eq!(iter.next(5).unwrap(), vec!["3", "4", "5", "6", "7"]);
}

#[test]
fn checkpoint_counts_primary_lines_only() {
    let store = Arc::new(MemoryPersister::new());
    let iter = IteratorBuilder::new()
        .slice("numbers", numbers(10), false)
        .seeds(2, Seeds::Lines(seeders(10)))
        .persist_to(store.clone())
        .build()
        .unwrap();

    iter.next(6).unwrap();
    assert_eq!(store.get("numbers").unwrap(), 3);
}

#[test]
fn stream_checkpoint_repositions_file() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryPersister::new());
    store.set("numbers", 7).unwrap();

    let iter = PersistentIterator::new(stream(&dir, false), store.clone()).unwrap();
    assert_eq!(iter.next(5).unwrap(), vec!["8", "9", "10"]);
    assert_eq!(store.get("numbers").unwrap(), 10);
    assert!(iter.next(1).unwrap_err().is_exhausted());
}

#[test]
fn errors_carry_decorator_names() {
    let store = Arc::new(MemoryPersister::new());
    let iter = IteratorBuilder::new()
        .slice("numbers", numbers(2), false)
        .blacklist(Arc::new(Blacklist::from_lines(["1"])))
        .persist_to(store)
        .build()
        .unwrap();

    let err = iter.next(2).unwrap_err();
    assert!(err.is_exhausted());
    assert_eq!(err.to_string(), "numbers: numbers: numbers: no more lines");
}
