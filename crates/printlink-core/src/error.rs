// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Printlink.

use thiserror::Error;

/// Reset signatures produced when the print service drops an idle stream.
///
/// These arrive as transport failures but only mean "reconnect now".
const BENIGN_DISCONNECT_SIGNATURES: &[&str] = &[
    "stream terminated by RST_STREAM with error code: PROTOCOL_ERROR",
    "stream error received: unspecific protocol error detected",
];

/// Top-level error type for all Printlink operations.
#[derive(Debug, Error)]
pub enum AgentError {
    // -- Session-fatal failures --
    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("no job-id in response")]
    NoJobId,

    /// The service closed the stream cleanly.
    #[error("stream closed by server")]
    StreamClosed,

    // -- Side paths --
    #[error("printer discovery failed: {0}")]
    Discovery(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Whether this is the idle-timeout reset the service sends to
    /// long-lived streams. Only transport errors can match.
    pub fn is_benign_disconnect(&self) -> bool {
        match self {
            Self::Transport(detail) => BENIGN_DISCONNECT_SIGNATURES
                .iter()
                .any(|signature| detail.contains(signature)),
            _ => false,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AgentError>;
