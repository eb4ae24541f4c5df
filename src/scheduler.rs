// src/scheduler.rs
//! Fixed-rate periodic task on the tokio runtime.
//!
//! `start` and `stop` are both idempotent. A cycle that is already running when
//! `stop` is called is allowed to finish (up to [`SHUTDOWN_AWAIT`]); no further
//! cycles start after the stop signal.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const SHUTDOWN_AWAIT: Duration = Duration::from_secs(5);

type Task = Arc<dyn Fn() + Send + Sync + 'static>;

pub struct PeriodicTask {
    name: &'static str,
    task: Task,
    initial_delay: Duration,
    period: Duration,
    running: AtomicBool,
    worker: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl PeriodicTask {
    pub fn new<F>(name: &'static str, task: F, initial_delay: Duration, period: Duration) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            name,
            task: Arc::new(task),
            initial_delay,
            period,
            running: AtomicBool::new(false),
            worker: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start ticking. Returns `false` (and does nothing) if already running.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(task = self.name, "scheduled task is already running");
            return false;
        }

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let task = Arc::clone(&self.task);
        let name = self.name;
        let period = self.period.max(Duration::from_millis(1));
        let start_at = Instant::now() + self.initial_delay;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(start_at, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        let task = Arc::clone(&task);
                        // The cycle runs to completion even if stop arrives meanwhile.
                        if let Err(e) = tokio::task::spawn_blocking(move || (*task)()).await {
                            warn!(task = name, error = %e, "scheduled task cycle panicked");
                        }
                    }
                }
            }
        });

        *self.worker.lock() = Some((token, handle));
        info!(
            task = self.name,
            initial_delay_ms = self.initial_delay.as_millis() as u64,
            period_ms = self.period.as_millis() as u64,
            "scheduled task started"
        );
        true
    }

    /// Stop ticking. Returns `false` (and does nothing) if not running.
    pub async fn stop(&self) -> bool {
        if self
            .running
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(task = self.name, "scheduled task is not running");
            return false;
        }

        info!(task = self.name, "stopping scheduled task");
        let worker = self.worker.lock().take();
        if let Some((token, mut handle)) = worker {
            token.cancel();
            if tokio::time::timeout(SHUTDOWN_AWAIT, &mut handle).await.is_err() {
                warn!(task = self.name, "forcing shutdown of scheduled task");
                handle.abort();
            }
        }
        info!(task = self.name, "scheduled task stopped");
        true
    }
}
