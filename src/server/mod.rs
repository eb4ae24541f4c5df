//! # News Analyzer Server
//! Accepts client connections and hands each one to a [`ConnectionHandler`]
//! running in a bounded worker pool.
//!
//! Lifecycle: `Stopped → Starting → Listening → Stopping → Stopped`.
//! When every pool slot is busy, new connections wait for a free slot; they
//! are never rejected. `stop()` stops the accept loop and signals handlers;
//! `start()`/`serve()` then waits up to the configured grace period for them
//! before cancelling the rest.

pub mod handler;

pub use handler::{ConnectionHandler, ConnectionState, ConnectionStats, LineOutcome};

use metrics::counter;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::ServerSettings;
use crate::error::{Error, Result};
use crate::storage::NewsItemStorage;

/// Pause after a failed accept so a persistent error (e.g. fd exhaustion)
/// does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Starting,
    Listening,
    Stopping,
}

pub struct NewsAnalyzerServer {
    config: ServerSettings,
    storage: Arc<NewsItemStorage>,
    state: watch::Sender<ServerState>,
    shutdown: Mutex<CancellationToken>,
}

impl NewsAnalyzerServer {
    pub fn new(config: ServerSettings, storage: Arc<NewsItemStorage>) -> Self {
        let (state, _) = watch::channel(ServerState::Stopped);
        Self {
            config,
            storage,
            state,
            shutdown: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn config(&self) -> &ServerSettings {
        &self.config
    }

    pub fn storage(&self) -> &Arc<NewsItemStorage> {
        &self.storage
    }

    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions (e.g. wait for `Listening` in tests).
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Bind the configured address and serve until [`stop`](Self::stop).
    pub async fn start(&self) -> Result<()> {
        let Some(token) = self.begin() else {
            warn!(state = ?self.state(), "server start ignored: not stopped");
            return Ok(());
        };

        let addr = self.config.listen_addr();
        info!(%addr, "news analyzer server is starting");
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(source) => {
                self.state.send_replace(ServerState::Stopped);
                let err = Error::BindFailure { addr, source };
                error!(error = %err, "server failed to start");
                return Err(err);
            }
        };

        self.run(listener, token).await;
        Ok(())
    }

    /// Serve an already bound listener until [`stop`](Self::stop).
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let Some(token) = self.begin() else {
            warn!(state = ?self.state(), "server start ignored: not stopped");
            return Ok(());
        };
        self.run(listener, token).await;
        Ok(())
    }

    /// Leave `Listening` and signal the accept loop and all handlers.
    /// Idempotent; a no-op unless the server is starting or listening.
    pub fn stop(&self) {
        let mut token = None;
        self.state.send_if_modified(|s| match s {
            ServerState::Starting | ServerState::Listening => {
                *s = ServerState::Stopping;
                token = Some(self.shutdown.lock().clone());
                true
            }
            _ => false,
        });

        if let Some(token) = token {
            info!("shutting down the news analyzer server");
            token.cancel();
        }
    }

    /// Resolves once the server is back in `Stopped` (handlers wound down).
    pub async fn stopped(&self) {
        let mut rx = self.subscribe();
        let _ = rx.wait_for(|s| *s == ServerState::Stopped).await;
    }

    /// `Stopped → Starting` with a fresh shutdown token.
    fn begin(&self) -> Option<CancellationToken> {
        let mut token = None;
        self.state.send_if_modified(|s| {
            if *s != ServerState::Stopped {
                return false;
            }
            let fresh = CancellationToken::new();
            *self.shutdown.lock() = fresh.clone();
            token = Some(fresh);
            *s = ServerState::Starting;
            true
        });
        token
    }

    async fn run(&self, listener: TcpListener, token: CancellationToken) {
        crate::metrics::ensure_metrics_described();
        self.state.send_if_modified(|s| {
            if *s == ServerState::Starting {
                *s = ServerState::Listening;
                true
            } else {
                false
            }
        });

        match listener.local_addr() {
            Ok(addr) => info!(%addr, pool_size = self.config.connections_pool_size, "listening"),
            Err(e) => warn!(error = %e, "listening on unknown address"),
        }

        let pool = Arc::new(Semaphore::new(self.config.connections_pool_size.max(1)));
        let mut handlers: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                Some(joined) = handlers.join_next(), if !handlers.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            error!(error = %e, "connection handler panicked");
                        }
                    }
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!(%peer, "new client connected");
                        counter!("news_connections_total").increment(1);
                        let storage = Arc::clone(&self.storage);
                        let pool = Arc::clone(&pool);
                        let token = token.clone();
                        handlers.spawn(async move {
                            // Queue for a pool slot; saturation delays, never rejects.
                            let _slot = tokio::select! {
                                _ = token.cancelled() => return,
                                slot = pool.acquire_owned() => match slot {
                                    Ok(slot) => slot,
                                    Err(_) => return,
                                },
                            };
                            ConnectionHandler::new(storage, peer).run(stream, token).await;
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "error accepting client connection");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
            }
        }

        drop(listener);
        self.wind_down(handlers).await;
        self.state.send_replace(ServerState::Stopped);
        info!("news analyzer server stopped");
    }

    async fn wind_down(&self, mut handlers: JoinSet<()>) {
        let grace = self.config.shutdown_grace();
        let finished = tokio::time::timeout(grace, async {
            while handlers.join_next().await.is_some() {}
        })
        .await;

        if finished.is_err() {
            let err = Error::ShutdownTimeout {
                pending: handlers.len(),
                grace,
            };
            warn!(error = %err, "forcing shutdown as some handlers are still running");
            handlers.abort_all();
            while handlers.join_next().await.is_some() {}
        }
    }
}
