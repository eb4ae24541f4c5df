//! # Priority Storage
//! Live aggregation state: priority → bucket of news items, newest first.
//!
//! The live mapping sits behind an [`ArcSwap`] and is never cleared in place.
//! Inserters load the current generation and push into it; a drain swaps in a
//! fresh generation and takes the old one. Before the old generation is handed
//! out as a [`Snapshot`] the drain waits for inserters that loaded it before the
//! swap to finish their push, so every insert lands in exactly one snapshot.

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::cmp::Reverse;
use std::collections::{btree_map, BTreeMap, VecDeque};
use std::sync::Arc;

use crate::protocol::NewsItem;

type Buckets = BTreeMap<Reverse<u32>, VecDeque<NewsItem>>;

#[derive(Debug, Default)]
struct Generation {
    buckets: Mutex<Buckets>,
}

/// Concurrent priority-bucketed store with an atomic snapshot-and-reset drain.
#[derive(Debug)]
pub struct NewsItemStorage {
    live: ArcSwap<Generation>,
}

impl Default for NewsItemStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl NewsItemStorage {
    pub fn new() -> Self {
        Self {
            live: ArcSwap::from_pointee(Generation::default()),
        }
    }

    /// Push `item` to the front of its priority bucket.
    pub fn insert(&self, item: NewsItem) {
        let generation = self.live.load_full();
        generation
            .buckets
            .lock()
            .entry(Reverse(item.priority()))
            .or_default()
            .push_front(item);
    }

    /// Swap the live mapping for an empty one and return the displaced mapping.
    pub fn drain(&self) -> Snapshot {
        let mut displaced = self.live.swap(Arc::new(Generation::default()));

        // An inserter may have loaded the old generation just before the swap.
        // It holds the Arc only for the duration of one push.
        let generation = loop {
            match Arc::try_unwrap(displaced) {
                Ok(generation) => break generation,
                Err(shared) => {
                    displaced = shared;
                    std::thread::yield_now();
                }
            }
        };

        Snapshot {
            buckets: generation.buckets.into_inner(),
        }
    }

    /// Number of items waiting for the next drain.
    pub fn pending(&self) -> usize {
        let generation = self.live.load();
        let buckets = generation.buckets.lock();
        buckets.values().map(VecDeque::len).sum()
    }
}

/// Anything the reporter can drain a snapshot from.
pub trait SnapshotSource: Send + Sync {
    fn drain(&self) -> Snapshot;
}

impl SnapshotSource for NewsItemStorage {
    fn drain(&self) -> Snapshot {
        NewsItemStorage::drain(self)
    }
}

/// Immutable result of a drain. Iterates buckets in descending priority,
/// and each bucket most-recently-inserted first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    buckets: Buckets,
}

impl Snapshot {
    /// Build a snapshot from `(priority, items)` pairs, items given in stored
    /// (most-recent-first) order.
    pub fn from_buckets<I, B>(buckets: I) -> Self
    where
        I: IntoIterator<Item = (u32, B)>,
        B: IntoIterator<Item = NewsItem>,
    {
        let mut out = Buckets::new();
        for (priority, items) in buckets {
            out.entry(Reverse(priority)).or_default().extend(items);
        }
        out.retain(|_, items| !items.is_empty());
        Self { buckets: out }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of items across all buckets.
    pub fn total(&self) -> usize {
        self.buckets.values().map(VecDeque::len).sum()
    }

    pub fn bucket(&self, priority: u32) -> Option<&VecDeque<NewsItem>> {
        self.buckets.get(&Reverse(priority))
    }

    pub fn priorities(&self) -> Vec<u32> {
        self.buckets.keys().map(|Reverse(p)| *p).collect()
    }

    pub fn iter(&self) -> SnapshotIter<'_> {
        SnapshotIter {
            inner: self.buckets.iter(),
        }
    }

    /// All items in report order.
    pub fn items(&self) -> impl Iterator<Item = &NewsItem> + '_ {
        self.buckets.values().flat_map(|bucket| bucket.iter())
    }
}

pub struct SnapshotIter<'a> {
    inner: btree_map::Iter<'a, Reverse<u32>, VecDeque<NewsItem>>,
}

impl<'a> Iterator for SnapshotIter<'a> {
    type Item = (u32, &'a VecDeque<NewsItem>);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(Reverse(p), items)| (*p, items))
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (u32, &'a VecDeque<NewsItem>);
    type IntoIter = SnapshotIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn item(h: &str, p: u32) -> NewsItem {
        NewsItem::new(h, p)
    }

    #[test]
    fn buckets_are_newest_first_and_drain_resets() {
        let storage = NewsItemStorage::new();
        storage.insert(item("first", 5));
        storage.insert(item("second", 5));
        storage.insert(item("third", 3));
        assert_eq!(storage.pending(), 3);

        let snap = storage.drain();
        assert_eq!(snap.bucket_count(), 2);
        assert_eq!(snap.priorities(), vec![5, 3]);

        let five: Vec<&str> = snap.bucket(5).unwrap().iter().map(|i| i.headline()).collect();
        assert_eq!(five, vec!["second", "first"]);
        assert_eq!(snap.bucket(3).unwrap().len(), 1);

        assert!(storage.drain().is_empty());
        assert_eq!(storage.pending(), 0);
    }

    #[test]
    fn accepts_priorities_outside_wire_range() {
        let storage = NewsItemStorage::new();
        storage.insert(item("big", 42));
        storage.insert(item("small", 0));
        assert_eq!(storage.drain().priorities(), vec![42, 0]);
    }

    #[test]
    fn concurrent_inserts_are_not_lost() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 1_000;

        let storage = Arc::new(NewsItemStorage::new());
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let storage = Arc::clone(&storage);
                thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        storage.insert(item(&format!("t{t} n{i}"), (i % 10) as u32));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(storage.drain().total(), THREADS * PER_THREAD);
    }

    #[test]
    fn drains_racing_inserts_see_each_item_once() {
        const THREADS: usize = 4;
        const PER_THREAD: usize = 2_000;

        let storage = Arc::new(NewsItemStorage::new());
        let inserters: Vec<_> = (0..THREADS)
            .map(|t| {
                let storage = Arc::clone(&storage);
                thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        storage.insert(item(&format!("t{t} n{i}"), (i % 3) as u32));
                    }
                })
            })
            .collect();

        let mut seen = 0;
        while inserters.iter().any(|h| !h.is_finished()) {
            seen += storage.drain().total();
        }
        for h in inserters {
            h.join().unwrap();
        }
        seen += storage.drain().total();

        assert_eq!(seen, THREADS * PER_THREAD);
    }

    #[test]
    fn snapshot_from_buckets_skips_empty() {
        let snap = Snapshot::from_buckets(vec![
            (1, vec![item("a", 1)]),
            (7, vec![]),
            (4, vec![item("b", 4), item("c", 4)]),
        ]);
        assert_eq!(snap.priorities(), vec![4, 1]);
        assert_eq!(snap.total(), 3);
        let order: Vec<&str> = snap.items().map(|i| i.headline()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }
}
