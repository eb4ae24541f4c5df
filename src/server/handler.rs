//! # Connection Handler
//! Serves exactly one client connection: reads lines, decodes them, keeps the
//! positive ones.
//!
//! State machine: `Reading → (Processing → Reading)* → Closed`. Malformed
//! lines are logged and skipped; the connection closes on end-of-stream, on a
//! read error, or when the server shuts down. The reader (and with it the
//! socket) is dropped on every exit path.

use metrics::{counter, gauge};
use std::fmt::Display;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::protocol;
use crate::sentiment::is_positive;
use crate::storage::NewsItemStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Reading,
    Processing,
    Closed,
}

/// What happened to a single protocol line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Stored,
    Discarded,
    Malformed,
}

/// Per-connection counters, returned when the connection closes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStats {
    pub lines: u64,
    pub stored: u64,
    pub discarded: u64,
    pub malformed: u64,
}

#[derive(Debug)]
enum CloseReason {
    EndOfStream,
    Shutdown,
    Lost(Error),
}

pub struct ConnectionHandler {
    storage: Arc<NewsItemStorage>,
    peer: String,
    state: ConnectionState,
    stats: ConnectionStats,
}

impl ConnectionHandler {
    pub fn new(storage: Arc<NewsItemStorage>, peer: impl Display) -> Self {
        Self {
            storage,
            peer: peer.to_string(),
            state: ConnectionState::Reading,
            stats: ConnectionStats::default(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn stats(&self) -> ConnectionStats {
        self.stats
    }

    /// Decode, filter and (if positive) store one line.
    pub fn process_line(&mut self, line: &str) -> LineOutcome {
        self.state = ConnectionState::Processing;
        self.stats.lines += 1;
        counter!("news_lines_total").increment(1);

        let outcome = match protocol::decode(line) {
            Ok(item) if is_positive(item.headline()) => {
                debug!(peer = %self.peer, item = %item, "stored positive news item");
                self.storage.insert(item);
                self.stats.stored += 1;
                counter!("news_stored_total").increment(1);
                LineOutcome::Stored
            }
            Ok(_) => {
                self.stats.discarded += 1;
                counter!("news_discarded_total").increment(1);
                LineOutcome::Discarded
            }
            Err(e) => {
                warn!(peer = %self.peer, error = %e, "invalid message received");
                self.stats.malformed += 1;
                counter!("news_malformed_total").increment(1);
                LineOutcome::Malformed
            }
        };

        self.state = ConnectionState::Reading;
        outcome
    }

    /// Read lines until the peer goes away or `shutdown` fires.
    pub async fn run<R>(mut self, reader: R, shutdown: CancellationToken) -> ConnectionStats
    where
        R: AsyncRead + Unpin,
    {
        crate::metrics::ensure_metrics_described();
        info!(peer = %self.peer, "handling new client connection");
        gauge!("news_connections_active").increment(1.0);

        let mut reader = BufReader::new(reader);
        let mut buf = Vec::with_capacity(256);

        let reason = loop {
            buf.clear();
            let read = tokio::select! {
                _ = shutdown.cancelled() => break CloseReason::Shutdown,
                r = reader.read_until(b'\n', &mut buf) => r,
            };
            match read {
                Ok(0) => break CloseReason::EndOfStream,
                Ok(_) => {
                    let line = String::from_utf8_lossy(strip_line_ending(&buf));
                    self.process_line(&line);
                }
                Err(e) => break CloseReason::Lost(Error::ConnectionLost(e)),
            }
        };

        drop(reader);
        self.state = ConnectionState::Closed;
        gauge!("news_connections_active").decrement(1.0);

        match reason {
            CloseReason::EndOfStream => {
                info!(peer = %self.peer, stats = ?self.stats, "client disconnected")
            }
            CloseReason::Shutdown => {
                info!(peer = %self.peer, stats = ?self.stats, "client closed by server shutdown")
            }
            CloseReason::Lost(Error::ConnectionLost(e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionAborted
                ) =>
            {
                warn!(peer = %self.peer, error = %e, "client disconnected forcefully")
            }
            CloseReason::Lost(e) => {
                error!(peer = %self.peer, error = %e, "client connection error")
            }
        }

        self.stats
    }
}

fn strip_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> (ConnectionHandler, Arc<NewsItemStorage>) {
        let storage = Arc::new(NewsItemStorage::new());
        (ConnectionHandler::new(Arc::clone(&storage), "test-peer"), storage)
    }

    #[test]
    fn classifies_lines() {
        let (mut h, storage) = handler();
        assert_eq!(h.process_line("up rise success;5"), LineOutcome::Stored);
        assert_eq!(h.process_line("fall bad failure;5"), LineOutcome::Discarded);
        assert_eq!(h.process_line("invalid;format"), LineOutcome::Malformed);
        assert_eq!(h.state(), ConnectionState::Reading);
        assert_eq!(
            h.stats(),
            ConnectionStats {
                lines: 3,
                stored: 1,
                discarded: 1,
                malformed: 1
            }
        );
        assert_eq!(storage.pending(), 1);
    }

    #[tokio::test]
    async fn reads_until_end_of_stream() {
        let (h, storage) = handler();
        let input: &[u8] = b"up rise success;5\r\ninvalid;format\ngood high;2";
        let stats = h.run(input, CancellationToken::new()).await;

        assert_eq!(stats.lines, 3);
        assert_eq!(stats.stored, 2);
        assert_eq!(stats.malformed, 1);

        let snap = storage.drain();
        assert_eq!(snap.priorities(), vec![5, 2]);
        assert_eq!(snap.bucket(5).unwrap()[0].headline(), "up rise success");
    }

    #[tokio::test]
    async fn stops_on_shutdown_signal() {
        let (h, _storage) = handler();
        let (_client, server_side) = tokio::io::duplex(64);
        let token = CancellationToken::new();
        token.cancel();
        let stats = h.run(server_side, token).await;
        assert_eq!(stats, ConnectionStats::default());
    }

    #[test]
    fn strips_crlf_and_lf() {
        assert_eq!(strip_line_ending(b"a;1\r\n"), b"a;1");
        assert_eq!(strip_line_ending(b"a;1\n"), b"a;1");
        assert_eq!(strip_line_ending(b"a;1"), b"a;1");
    }
}
