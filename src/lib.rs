// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod config;
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod reporter;
pub mod scheduler;
pub mod sentiment;
pub mod server;
pub mod storage;
pub mod telemetry;

// Demo feed (generator + reconnecting client)
pub mod feed;

// ---- Re-exports for stable public API ----
pub use crate::config::Settings;
pub use crate::error::{Error, Malformed};
pub use crate::protocol::{decode, encode, NewsItem};
pub use crate::reporter::{NewsSummaryReporter, Summary};
pub use crate::scheduler::PeriodicTask;
pub use crate::sentiment::is_positive;
pub use crate::server::{NewsAnalyzerServer, ServerState};
pub use crate::storage::{NewsItemStorage, Snapshot};

use std::sync::Arc;

/// Build the report scheduler for `storage` from `settings`.
///
/// The returned task is not started; call [`PeriodicTask::start`] from inside
/// the runtime.
pub fn report_task(settings: &Settings, storage: Arc<NewsItemStorage>) -> PeriodicTask {
    let reporter = NewsSummaryReporter::new(storage, settings.reporter.period());
    PeriodicTask::new(
        "news-summary-report",
        move || {
            reporter.report();
        },
        settings.reporter.initial_delay(),
        settings.reporter.period(),
    )
}
