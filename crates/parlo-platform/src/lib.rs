//! Host capability layer for parlo.
//!
//! The speech engine never touches the operating system directly. Every
//! platform-dependent operation sits behind a trait so the engine can run
//! against a fake host in tests and against real binaries in the CLI:
//!
//! | Trait | Capability |
//! |-------|------------|
//! | [`speech::SpeechHost`] | native speech engine: speak, cancel, list voices, change notifications |
//! | [`audio::AudioOutput`] | load, play and release fetched audio |
//! | [`http::HttpClient`] | outbound HTTP for the remote TTS proxy |
//! | [`fs::FileSystem`] | config file access |
//! | [`env::Environment`] | environment variable access |
//!
//! [`Platform`] bundles them. [`NativePlatform`] wires the command-line
//! implementations (`espeak-ng` piped into `aplay`/`paplay`/`ffplay` for
//! speech, `ffplay`/`mpg123`/`paplay` for fetched audio, reqwest for HTTP).

pub mod audio;
pub mod config_loader;
pub mod env;
pub mod error;
pub mod fs;
pub mod http;
pub mod process;
pub mod speech;

#[cfg(feature = "native")]
pub mod command_audio;
#[cfg(feature = "native")]
pub mod command_host;

use std::sync::Arc;

pub use error::HostError;
#[cfg(feature = "native")]
use parlo_types::config::SpeechConfig;

/// Bundle of all host capabilities.
///
/// The speech and audio capabilities are handed out as `Arc`s because the
/// engine keeps them alive inside background tasks (catalog refresh,
/// utterance watchers).
pub trait Platform: Send + Sync {
    /// HTTP client for the remote proxy.
    fn http(&self) -> Arc<dyn http::HttpClient>;

    /// Filesystem operations.
    fn fs(&self) -> &dyn fs::FileSystem;

    /// Environment variable access.
    fn env(&self) -> &dyn env::Environment;

    /// Native speech engine.
    fn speech(&self) -> Arc<dyn speech::SpeechHost>;

    /// Audio output for pre-rendered remote audio.
    fn audio(&self) -> Arc<dyn audio::AudioOutput>;
}

/// Native platform: command-line speech and audio, reqwest HTTP.
#[cfg(feature = "native")]
pub struct NativePlatform {
    http: Arc<http::NativeHttpClient>,
    fs: fs::NativeFileSystem,
    env: env::NativeEnvironment,
    speech: Arc<command_host::CommandSpeechHost>,
    audio: Arc<command_audio::CommandAudioOutput>,
}

#[cfg(feature = "native")]
impl NativePlatform {
    /// Create a native platform, auto-detecting engine and player binaries.
    pub fn new() -> Self {
        Self::for_speech(&SpeechConfig::default())
    }

    /// Create a native platform honouring the binary overrides in
    /// `speech.local.engine_bin`, `speech.local.player_bin` and
    /// `speech.remote.player_bin`.
    pub fn for_speech(config: &SpeechConfig) -> Self {
        Self {
            http: Arc::new(http::NativeHttpClient::new()),
            fs: fs::NativeFileSystem,
            env: env::NativeEnvironment,
            speech: Arc::new(command_host::CommandSpeechHost::detect(
                config.local.engine_bin.as_deref(),
                config.local.player_bin.as_deref(),
            )),
            audio: Arc::new(command_audio::CommandAudioOutput::detect(
                config.remote.player_bin.as_deref(),
            )),
        }
    }
}

#[cfg(feature = "native")]
impl Default for NativePlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "native")]
impl Platform for NativePlatform {
    fn http(&self) -> Arc<dyn http::HttpClient> {
        self.http.clone()
    }

    fn fs(&self) -> &dyn fs::FileSystem {
        &self.fs
    }

    fn env(&self) -> &dyn env::Environment {
        &self.env
    }

    fn speech(&self) -> Arc<dyn speech::SpeechHost> {
        self.speech.clone()
    }

    fn audio(&self) -> Arc<dyn audio::AudioOutput> {
        self.audio.clone()
    }
}
