//! # Summary Reporter
//! Drains the priority storage once per period and reports the total item
//! count plus up to three unique headlines, highest priority first.
//!
//! Uniqueness is by headline signature: the set of distinct words, so
//! "up rise success" and "success rise up" are the same headline. The first
//! one met in report order wins.

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::protocol::NewsItem;
use crate::sentiment::tokenize;
use crate::storage::{NewsItemStorage, Snapshot, SnapshotSource};

pub const TOP_HEADLINES_MAX_COUNT: usize = 3;

/// Outcome of one drain-and-report cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub total: usize,
    pub top: Vec<NewsItem>,
}

/// Order-insensitive set of the distinct words in `headline`.
pub fn headline_signature(headline: &str) -> BTreeSet<&str> {
    tokenize(headline).collect()
}

/// First `limit` items of `snapshot` in report order with unseen signatures.
pub fn top_unique(snapshot: &Snapshot, limit: usize) -> Vec<NewsItem> {
    let mut seen: HashSet<BTreeSet<&str>> = HashSet::new();
    let mut top = Vec::with_capacity(limit);

    'buckets: for (_priority, bucket) in snapshot {
        for item in bucket {
            if top.len() >= limit {
                break 'buckets;
            }
            if seen.insert(headline_signature(item.headline())) {
                top.push(item.clone());
            }
        }
    }

    top
}

/// Pure aggregation step of a report, for a window ending at `window_end`.
pub fn summarize(snapshot: &Snapshot, window_end: DateTime<Utc>, period: Duration) -> Summary {
    let span = chrono::Duration::from_std(period).unwrap_or_else(|_| chrono::Duration::zero());
    Summary {
        window_start: window_end - span,
        window_end,
        total: snapshot.total(),
        top: top_unique(snapshot, TOP_HEADLINES_MAX_COUNT),
    }
}

pub struct NewsSummaryReporter<S: SnapshotSource = NewsItemStorage> {
    source: Arc<S>,
    period: Duration,
}

impl<S: SnapshotSource> NewsSummaryReporter<S> {
    pub fn new(source: Arc<S>, period: Duration) -> Self {
        Self { source, period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Drain, aggregate and emit one report.
    pub fn run_cycle(&self) -> Summary {
        let now = Utc::now();
        let snapshot = self.source.drain();
        let summary = summarize(&snapshot, now, self.period);
        emit(&summary);
        summary
    }

    /// Run one cycle and return the number of items it covered.
    pub fn report(&self) -> usize {
        self.run_cycle().total
    }
}

fn emit(summary: &Summary) {
    crate::metrics::ensure_metrics_described();
    counter!("news_reports_total").increment(1);
    gauge!("news_report_total_items").set(summary.total as f64);

    info!(
        target: "reporter",
        window_start = %summary.window_start.to_rfc3339(),
        window_end = %summary.window_end.to_rfc3339(),
        total = summary.total,
        "Window [{} - {}) -> Total News: {}",
        summary.window_start.to_rfc3339(),
        summary.window_end.to_rfc3339(),
        summary.total
    );
    for item in &summary.top {
        info!(
            target: "reporter",
            priority = item.priority(),
            headline = item.headline(),
            "Priority: {}, Headline: {}",
            item.priority(),
            item.headline()
        );
    }
}
