//! Audio output capability for pre-rendered speech.
//!
//! Playback is split into three steps so callers can guarantee cleanup:
//! [`AudioOutput::load`] allocates a playable resource, [`AudioOutput::play`]
//! plays it to the end, and [`AudioOutput::release`] reclaims it. `release`
//! is synchronous so it can run from `Drop`.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::error::HostError;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Opaque reference to a loaded audio resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioHandle(u64);

impl AudioHandle {
    /// Allocate a process-unique handle. Implementations call this in
    /// [`AudioOutput::load`].
    pub fn next() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Plays encoded audio (MP3 from the remote proxy).
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Turn encoded bytes into a playable resource.
    async fn load(&self, audio: &[u8], mime_type: &str) -> Result<AudioHandle, HostError>;

    /// Play a loaded resource; resolves when playback ends or fails.
    async fn play(&self, handle: &AudioHandle) -> Result<(), HostError>;

    /// Stop playback (if any) and reclaim the resource.
    fn release(&self, handle: &AudioHandle);
}
