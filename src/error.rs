//! # Errors
//! Failure taxonomy shared by the codec, the connection handlers and the server.
//!
//! Per-connection failures (`MalformedMessage`, `ConnectionLost`) never leave
//! the handler that produced them; they are logged and counted. Only
//! `BindFailure` is fatal, and only to server startup.

use std::io;
use std::time::Duration;

/// Why a protocol line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Malformed {
    #[error("missing ';' separator")]
    MissingSeparator,
    #[error("expected exactly two fields, found {0}")]
    FieldCount(usize),
    #[error("headline is empty")]
    EmptyHeadline,
    #[error("priority is not an integer")]
    NotAnInteger,
    #[error("priority {0} is outside 0..=9")]
    PriorityOutOfRange(i64),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed message {line:?}: {reason}")]
    MalformedMessage { line: String, reason: Malformed },

    #[error("connection lost: {0}")]
    ConnectionLost(#[source] io::Error),

    #[error("failed to bind {addr}: {source}")]
    BindFailure {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("{pending} connection handler(s) still running after {grace:?}; cancelled")]
    ShutdownTimeout { pending: usize, grace: Duration },
}

impl Error {
    pub(crate) fn malformed(line: &str, reason: Malformed) -> Self {
        Error::MalformedMessage {
            line: line.to_string(),
            reason,
        }
    }

    /// The rejection reason, if this is a `MalformedMessage`.
    pub fn malformed_reason(&self) -> Option<Malformed> {
        match self {
            Error::MalformedMessage { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
