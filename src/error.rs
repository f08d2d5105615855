//! Error types shared by the parser, the request lifecycle and the server.

use std::collections::TryReserveError;
use std::io;

use crate::http::parser::ParseError;

/// Everything that can go wrong between binding the port and writing a response.
///
/// Socket setup failures (`Bind`, `Listen`, `Runtime`) are terminal for the
/// server. Everything else aborts at most the connection it happened on.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to listen: {0}")]
    Listen(#[source] io::Error),

    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    #[error("allocation failed: {0}")]
    Alloc(#[from] TryReserveError),

    #[error("header parse failure: {0}")]
    HeaderParse(#[from] ParseError),

    #[error("connection not ready after {attempts} consecutive attempts")]
    RetryExceeded { attempts: u32 },

    #[error("malformed value for header {name}: {value:?}")]
    MalformedHeaderValue { name: &'static str, value: String },

    #[error("declared body of {declared} bytes exceeds the {limit} byte limit")]
    BodyTooLarge { declared: usize, limit: usize },

    #[error("failed to write response: {0}")]
    Write(#[source] io::Error),

    #[error("failed to start worker runtime: {0}")]
    Runtime(#[source] io::Error),
}

/// Coarse classification of a failed request, kept on the request itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Alloc,
    HeaderParse,
    RetryExceeded,
    MalformedHeaderValue,
    BodyTooLarge,
    Other,
}

impl Error {
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Alloc(_) => FailureKind::Alloc,
            Error::HeaderParse(_) => FailureKind::HeaderParse,
            Error::RetryExceeded { .. } => FailureKind::RetryExceeded,
            Error::MalformedHeaderValue { .. } => FailureKind::MalformedHeaderValue,
            Error::BodyTooLarge { .. } => FailureKind::BodyTooLarge,
            _ => FailureKind::Other,
        }
    }
}
