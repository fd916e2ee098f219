//! Host capability errors.

use thiserror::Error;

/// Failure reported by a host capability (speech engine or audio output).
#[derive(Debug, Error)]
pub enum HostError {
    /// The capability does not exist on this host (no engine binary, no
    /// audio player, no platform support).
    #[error("unsupported on this host: {0}")]
    Unsupported(String),

    /// The engine or player was found but refused or failed the request.
    #[error("engine failure: {0}")]
    Engine(String),

    /// The audio payload could not be turned into a playable resource.
    #[error("invalid audio: {0}")]
    InvalidAudio(String),

    /// An [`AudioHandle`](crate::audio::AudioHandle) that was never loaded
    /// or was already released.
    #[error("unknown audio handle: {0}")]
    UnknownHandle(u64),

    /// I/O error while spawning or talking to a helper process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
