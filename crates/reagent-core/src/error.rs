// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

/// Convenience alias used across all reagent crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Uniform failure taxonomy propagated across every component of the runtime.
///
/// Each public operation in the workspace returns one of these kinds or a
/// successful value.  Provider drivers map transport failures onto the
/// network-related variants; the agent loop maps them onto a run status
/// without touching the transcript for the failed turn.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Host allocator exhaustion (arena block growth failed).
    #[error("out of memory")]
    NoMemory,

    #[error("network error: {0}")]
    Network(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("request timed out")]
    Timeout,

    #[error("DNS resolution failed: {0}")]
    Dns(String),

    /// The server answered with a non-success status code.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("not initialized")]
    NotInitialized,

    /// Backend-specific failure reported by a provider or tool runtime.
    #[error("backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not implemented")]
    NotImplemented,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not connected")]
    NotConnected,

    /// Violation of a wire protocol (SSE framing, MCP contract, ...).
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("response too large")]
    ResponseTooLarge,

    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// Discriminant-only view of [`Error`], for callers that dispatch on the
/// failure code rather than the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArg,
    NoMemory,
    Network,
    Tls,
    Timeout,
    Dns,
    Http,
    NotInitialized,
    Backend,
    Io,
    NotImplemented,
    NotFound,
    NotConnected,
    Protocol,
    Parse,
    ResponseTooLarge,
    InvalidState,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArg(_) => ErrorKind::InvalidArg,
            Error::NoMemory => ErrorKind::NoMemory,
            Error::Network(_) => ErrorKind::Network,
            Error::Tls(_) => ErrorKind::Tls,
            Error::Timeout => ErrorKind::Timeout,
            Error::Dns(_) => ErrorKind::Dns,
            Error::Http { .. } => ErrorKind::Http,
            Error::NotInitialized => ErrorKind::NotInitialized,
            Error::Backend(_) => ErrorKind::Backend,
            Error::Io(_) => ErrorKind::Io,
            Error::NotImplemented => ErrorKind::NotImplemented,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::NotConnected => ErrorKind::NotConnected,
            Error::Protocol(_) => ErrorKind::Protocol,
            Error::Parse(_) => ErrorKind::Parse,
            Error::ResponseTooLarge => ErrorKind::ResponseTooLarge,
            Error::InvalidState(_) => ErrorKind::InvalidState,
        }
    }

    /// True for transport-level failures (network, TLS, timeout, DNS, HTTP).
    ///
    /// The agent loop uses this to distinguish a failed provider turn (no
    /// transcript mutation, run status `ProviderError`) from caller mistakes.
    pub fn is_transport(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Network
                | ErrorKind::Tls
                | ErrorKind::Timeout
                | ErrorKind::Dns
                | ErrorKind::Http
        )
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
