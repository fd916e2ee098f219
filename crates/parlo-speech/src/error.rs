//! Speech engine error types.
//!
//! None of these reach callers of [`SpeechEngine::speak`](crate::SpeechEngine::speak):
//! the engine logs and swallows them. They exist so the drivers can report
//! *why* an attempt failed, to logs and to tests.

use parlo_platform::HostError;
use thiserror::Error;

/// Failure of one playback attempt.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// The proxy request could not be sent or its body not read.
    #[error("proxy request failed: {0}")]
    Request(String),

    /// The proxy answered with a non-2xx status.
    #[error("proxy returned {status}: {body}")]
    ProxyStatus { status: u16, body: String },

    /// The proxy answered 2xx but the body is not playable audio.
    #[error("invalid audio from proxy: {0}")]
    InvalidAudio(String),

    /// An attempt exceeded its ceiling.
    #[error("timed out after {0}ms")]
    Timeout(u64),

    /// Remote fallback is disabled or has no endpoint.
    #[error("remote speech not configured")]
    NotConfigured,

    /// A host capability failed.
    #[error(transparent)]
    Host(#[from] HostError),
}

pub type Result<T> = std::result::Result<T, SpeechError>;
