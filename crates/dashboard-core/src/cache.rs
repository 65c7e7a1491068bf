//! Mutex-guarded snapshot caches.
//!
//! The owner thread is the only writer. It replaces the whole record
//! list on [`SnapshotCache::rebuild`] and applies field-level updates
//! with [`SnapshotCache::patch`]. Readers on any thread get owned copies
//! from [`SnapshotCache::snapshot`] or [`SnapshotCache::get`], so a
//! reader never observes a half-applied write and never holds a
//! reference into the live store.
//!
//! Critical sections are limited to a clone, a swap, or a single field
//! update. Record extraction happens before the lock is taken.

use std::fmt;

use parking_lot::Mutex;
use tracing::{debug, warn};

/// A record with a stable integer identity.
pub trait Keyed {
    /// The entity id used by [`SnapshotCache::patch`] and [`SnapshotCache::get`].
    fn key(&self) -> i32;
}

/// Outcome of a [`SnapshotCache::rebuild_from`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RebuildStats {
    /// Records that made it into the cache.
    pub kept: usize,
    /// Source records that could not be read and were skipped.
    pub skipped: usize,
    /// Cache generation after the rebuild.
    pub generation: u64,
}

#[derive(Debug)]
struct Store<T> {
    records: Vec<T>,
    ready: bool,
    generation: u64,
}

/// Point-in-time list of records owned by the simulation's owner thread.
#[derive(Debug)]
pub struct SnapshotCache<T> {
    name: &'static str,
    store: Mutex<Store<T>>,
}

impl<T: Keyed + Clone> SnapshotCache<T> {
    /// Create an empty, not-ready cache. `name` labels log lines.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            store: Mutex::new(Store {
                records: Vec::new(),
                ready: false,
                generation: 0,
            }),
        }
    }

    /// Replace the whole list in one step and mark the cache ready.
    ///
    /// Returns the new generation number.
    pub fn rebuild(&self, records: Vec<T>) -> u64 {
        let count = records.len();
        let generation = {
            let mut store = self.store.lock();
            store.records = records;
            store.ready = true;
            store.generation = store.generation.saturating_add(1);
            store.generation
        };
        debug!(cache = self.name, count, generation, "Cache rebuilt");
        generation
    }

    /// Rebuild from a fallible source, skipping records that fail to extract.
    ///
    /// Each failure is logged at warning level. A source made entirely of
    /// failures still produces an empty, ready cache.
    pub fn rebuild_from<I, E>(&self, source: I) -> RebuildStats
    where
        I: IntoIterator<Item = Result<T, E>>,
        E: fmt::Display,
    {
        let mut records = Vec::new();
        let mut skipped: usize = 0;
        for item in source {
            match item {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped = skipped.saturating_add(1);
                    warn!(cache = self.name, error = %e, "Skipping unreadable record");
                }
            }
        }
        let kept = records.len();
        let generation = self.rebuild(records);
        RebuildStats {
            kept,
            skipped,
            generation,
        }
    }

    /// Apply `update` to the record with id `key`.
    ///
    /// Returns `false` without calling `update` when no such record is
    /// cached; events for entities the cache has not seen yet are normal.
    pub fn patch<F>(&self, key: i32, update: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let mut store = self.store.lock();
        match store.records.iter_mut().find(|r| r.key() == key) {
            Some(record) => {
                update(record);
                true
            }
            None => false,
        }
    }

    /// Copy of the record with id `key`.
    pub fn get(&self, key: i32) -> Option<T> {
        self.store
            .lock()
            .records
            .iter()
            .find(|r| r.key() == key)
            .cloned()
    }

    /// Copy of the whole list as of one instant.
    pub fn snapshot(&self) -> Vec<T> {
        self.store.lock().records.clone()
    }

    /// Drop every record and mark the cache not ready.
    pub fn clear(&self) {
        let mut store = self.store.lock();
        store.records.clear();
        store.ready = false;
        store.generation = store.generation.saturating_add(1);
    }

    /// Number of cached records.
    pub fn len(&self) -> usize {
        self.store.lock().records.len()
    }

    /// Whether the cache holds no records.
    pub fn is_empty(&self) -> bool {
        self.store.lock().records.is_empty()
    }

    /// Whether at least one rebuild has completed since creation or the last clear.
    pub fn is_ready(&self) -> bool {
        self.store.lock().ready
    }

    /// Counter bumped by every rebuild and clear.
    pub fn generation(&self) -> u64 {
        self.store.lock().generation
    }
}

/// Single-record cache for singleton state.
#[derive(Debug, Default)]
pub struct SnapshotCell<T> {
    value: Mutex<T>,
}

impl<T: Clone> SnapshotCell<T> {
    /// Create a cell holding `value`.
    pub const fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }

    /// Copy of the current value.
    pub fn get(&self) -> T {
        self.value.lock().clone()
    }

    /// Replace the value.
    pub fn replace(&self, value: T) {
        *self.value.lock() = value;
    }

    /// Update the value in place under the lock.
    pub fn update<F>(&self, update: F)
    where
        F: FnOnce(&mut T),
    {
        update(&mut *self.value.lock());
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::arithmetic_side_effects)]

    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use super::*;

    /// Record whose two halves must always agree.
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Probe {
        id: i32,
        left: u64,
        right: u64,
    }

    impl Keyed for Probe {
        fn key(&self) -> i32 {
            self.id
        }
    }

    fn probes(ids: std::ops::Range<i32>) -> Vec<Probe> {
        ids.map(|id| Probe {
            id,
            left: 0,
            right: 0,
        })
        .collect()
    }

    #[test]
    fn starts_empty_and_not_ready() {
        let cache: SnapshotCache<Probe> = SnapshotCache::new("probe");
        assert!(cache.is_empty());
        assert!(!cache.is_ready());
        assert!(cache.snapshot().is_empty());
    }

    #[test]
    fn patch_of_unknown_id_is_a_no_op() {
        let cache = SnapshotCache::new("probe");
        cache.rebuild(probes(0..3));
        let mut called = false;
        assert!(!cache.patch(99, |_| called = true));
        assert!(!called);
        assert_eq!(cache.snapshot(), probes(0..3));
    }

    #[test]
    fn snapshot_is_detached_from_later_writes() {
        let cache = SnapshotCache::new("probe");
        cache.rebuild(probes(0..2));
        let before = cache.snapshot();
        assert!(cache.patch(1, |p| p.left = 7));
        assert_eq!(before.get(1).unwrap().left, 0);
        assert_eq!(cache.get(1).unwrap().left, 7);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let cache = SnapshotCache::new("probe");
        cache.rebuild(Vec::new());
        cache.rebuild(probes(0..5));
        let first = cache.snapshot();
        cache.rebuild(probes(0..5));
        let second = cache.snapshot();
        assert_eq!(first, second);
        assert_eq!(second.len(), 5);
    }

    #[test]
    fn rebuild_from_skips_failures() {
        let cache = SnapshotCache::new("probe");
        let source: Vec<Result<Probe, String>> = vec![
            Ok(Probe {
                id: 1,
                left: 0,
                right: 0,
            }),
            Err(String::from("garbage")),
            Ok(Probe {
                id: 3,
                left: 0,
                right: 0,
            }),
        ];
        let stats = cache.rebuild_from(source);
        assert_eq!(stats.kept, 2);
        assert_eq!(stats.skipped, 1);
        assert!(cache.is_ready());
        let ids: Vec<i32> = cache.snapshot().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn clear_resets_readiness() {
        let cache = SnapshotCache::new("probe");
        let g1 = cache.rebuild(probes(0..2));
        cache.clear();
        assert!(!cache.is_ready());
        assert!(cache.is_empty());
        assert!(cache.generation() > g1);
    }

    #[test]
    fn concurrent_snapshots_never_see_torn_records() {
        const WRITERS: i32 = 4;
        const READERS: usize = 4;
        const ROUNDS: u64 = 2_000;

        let cache = Arc::new(SnapshotCache::new("probe"));
        cache.rebuild(probes(0..WRITERS));
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..READERS)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    let mut seen = 0_usize;
                    while !done.load(Ordering::Acquire) {
                        for probe in cache.snapshot() {
                            assert_eq!(probe.left, probe.right, "torn record {probe:?}");
                        }
                        seen += 1;
                    }
                    seen
                })
            })
            .collect();

        let writers: Vec<_> = (0..WRITERS)
            .map(|id| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for round in 1..=ROUNDS {
                        cache.patch(id, |p| {
                            p.left = round;
                            p.right = round;
                        });
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().unwrap();
        }
        done.store(true, Ordering::Release);
        for reader in readers {
            reader.join().unwrap();
        }

        for probe in cache.snapshot() {
            assert_eq!(probe.left, ROUNDS);
            assert_eq!(probe.right, ROUNDS);
        }
    }

    #[test]
    fn cell_update_and_replace() {
        let cell = SnapshotCell::new(1_u32);
        cell.update(|v| *v += 1);
        assert_eq!(cell.get(), 2);
        cell.replace(10);
        assert_eq!(cell.get(), 10);
    }
}
