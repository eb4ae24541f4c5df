// tests/storage_drain.rs
use news_analyzer::{NewsItem, NewsItemStorage};
use std::sync::Arc;
use std::thread;

#[test]
fn drain_groups_by_priority_newest_first() {
    let storage = NewsItemStorage::new();
    storage.insert(NewsItem::new("up rise", 5));
    storage.insert(NewsItem::new("good high", 5));
    storage.insert(NewsItem::new("success up", 3));

    let snap = storage.drain();
    assert_eq!(snap.bucket_count(), 2);
    assert_eq!(snap.total(), 3);

    let walk: Vec<(u32, Vec<&str>)> = snap
        .iter()
        .map(|(p, bucket)| (p, bucket.iter().map(|i| i.headline()).collect()))
        .collect();
    assert_eq!(
        walk,
        vec![(5, vec!["good high", "up rise"]), (3, vec!["success up"])]
    );

    // Exactly once: nothing left for the next drain.
    assert!(storage.drain().is_empty());
}

#[test]
fn n_threads_times_m_items_survive_one_drain() {
    let n = 6;
    let m = 500;
    let storage = Arc::new(NewsItemStorage::new());

    let workers: Vec<_> = (0..n)
        .map(|t| {
            let storage = Arc::clone(&storage);
            thread::spawn(move || {
                for i in 0..m {
                    storage.insert(NewsItem::new(format!("up {t} {i}"), (i % 10) as u32));
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    let snap = storage.drain();
    assert_eq!(snap.total(), n * m);
    assert_eq!(snap.priorities(), (0..10).rev().collect::<Vec<u32>>());
}
