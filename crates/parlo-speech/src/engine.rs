//! Playback orchestrator.
//!
//! [`SpeechEngine`] is the public entry point. Each `speak` runs the local
//! driver first and the remote fallback only when the local attempt
//! failed:
//!
//! ```text
//! Idle -> AttemptingLocal -> Idle
//!                         -> AttemptingRemote -> Idle
//! ```
//!
//! A newer `speak` supersedes an older one instead of queueing behind it.
//! The superseded call's local attempt settles as a success, so it never
//! falls back, and it can no longer move the published state.

use std::sync::{Arc, Mutex};

use parlo_platform::Platform;
use parlo_platform::audio::AudioOutput;
use parlo_platform::http::HttpClient;
use parlo_platform::speech::SpeechHost;
use parlo_types::config::{SpeechConfig, VoiceDefaults};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::catalog::{VoiceCatalog, covers_language};
use crate::local::{LocalDriver, LocalDriverConfig};
use crate::remote::RemoteFallback;
use crate::request::{SpeakOptions, SpeakRequest};

/// Where the engine is in its Local -> Remote sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    AttemptingLocal,
    AttemptingRemote,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AttemptingLocal => write!(f, "attempting_local"),
            Self::AttemptingRemote => write!(f, "attempting_remote"),
        }
    }
}

/// The call that currently owns the engine.
struct Attempt {
    generation: u64,
    cancel: CancellationToken,
}

/// Speech playback engine: voice catalog, local driver, remote fallback.
pub struct SpeechEngine {
    host: Arc<dyn SpeechHost>,
    catalog: Arc<VoiceCatalog>,
    local: LocalDriver,
    local_enabled: bool,
    remote: RemoteFallback,
    defaults: VoiceDefaults,
    state: watch::Sender<PlaybackState>,
    current: Mutex<Attempt>,
}

impl SpeechEngine {
    /// Build an engine on the platform's speech, audio and HTTP capabilities.
    pub fn new(config: &SpeechConfig, platform: &dyn Platform) -> Self {
        Self::from_parts(config, platform.speech(), platform.http(), platform.audio())
    }

    pub fn from_parts(
        config: &SpeechConfig,
        host: Arc<dyn SpeechHost>,
        http: Arc<dyn HttpClient>,
        audio: Arc<dyn AudioOutput>,
    ) -> Self {
        let catalog = VoiceCatalog::new(host.clone());
        let local = LocalDriver::new(
            host.clone(),
            catalog.clone(),
            LocalDriverConfig::from(&config.local),
        );
        let remote = RemoteFallback::new(config.remote.clone(), http, audio);
        let (state, _) = watch::channel(PlaybackState::Idle);

        Self {
            host,
            catalog,
            local,
            local_enabled: config.local.enabled,
            remote,
            defaults: config.defaults.clone(),
            state,
            current: Mutex::new(Attempt {
                generation: 0,
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Speak `text` in `language`. Resolves once playback finished, failed
    /// on both paths, or was superseded. Failures are logged, never
    /// returned; blank text is ignored.
    pub async fn speak(&self, text: &str, language: &str, options: SpeakOptions) {
        let Some(request) = SpeakRequest::new(text, language, options, &self.defaults) else {
            debug!("blank text, nothing to speak");
            return;
        };

        let (generation, cancel) = self.begin();
        self.publish(generation, PlaybackState::AttemptingLocal);

        let spoken_locally =
            self.local_enabled && self.local.try_speak(&request, &cancel).await;

        if !spoken_locally {
            self.publish(generation, PlaybackState::AttemptingRemote);
            info!(language = %request.language_code, "local speech unavailable, using remote");
            self.remote.play(&request.text, &request.language_code).await;
        }

        self.publish(generation, PlaybackState::Idle);
    }

    /// Stop the current local utterance. An in-flight remote request is
    /// left to finish on its own.
    pub fn cancel(&self) {
        debug!(state = %self.current_state(), "cancel requested");
        self.host.cancel();
        self.lock_current().cancel.cancel();
    }

    /// Warm the voice catalog and report whether any local voice covers
    /// `language`'s primary subtag.
    pub async fn preload(&self, language: &str) -> bool {
        if !self.host.is_supported() {
            return false;
        }
        // A list loaded earlier may be stale; a first load is already fresh.
        let was_loaded = self.catalog.is_loaded();
        let mut voices = self.catalog.voices().await;
        if was_loaded && voices.is_empty() {
            voices = Arc::new(self.catalog.refresh().await);
        }
        let available = covers_language(&voices, language);
        debug!(language, available, "preloaded voices");
        available
    }

    pub fn current_state(&self) -> PlaybackState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    pub fn catalog(&self) -> &Arc<VoiceCatalog> {
        &self.catalog
    }

    /// Take ownership of the engine for a new call, superseding the
    /// previous one.
    fn begin(&self) -> (u64, CancellationToken) {
        let mut current = self.lock_current();
        current.cancel.cancel();
        current.generation += 1;
        current.cancel = CancellationToken::new();
        (current.generation, current.cancel.clone())
    }

    /// Move to `state` if `generation` still owns the engine.
    fn publish(&self, generation: u64, state: PlaybackState) {
        let current = self.lock_current();
        if current.generation == generation {
            self.state.send_replace(state);
        }
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Attempt> {
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
