//! Speech playback configuration.
//!
//! Covers the local host engine timers, the remote TTS proxy used as a
//! fallback, and the default prosody applied when a caller passes none.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ParloError, Result};
use crate::secret::SecretString;

/// Longest text the TTS proxy accepts, in characters.
pub const MAX_PROXY_TEXT_CHARS: usize = 200;

/// Speech playback configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SpeechConfig {
    /// Local (host engine) synthesis settings.
    #[serde(default)]
    pub local: LocalSpeechConfig,

    /// Remote proxy fallback settings.
    #[serde(default)]
    pub remote: RemoteSpeechConfig,

    /// Prosody used when the caller does not override it.
    #[serde(default)]
    pub defaults: VoiceDefaults,
}

impl SpeechConfig {
    /// Reject values that would make the timers or the proxy unusable.
    pub fn validate(&self) -> Result<()> {
        if self.local.start_check_ms == 0 {
            return Err(ParloError::ConfigInvalid {
                reason: "speech.local.start_check_ms must be greater than zero".into(),
            });
        }
        if self.local.max_utterance_ms < self.local.start_check_ms {
            return Err(ParloError::ConfigInvalid {
                reason: "speech.local.max_utterance_ms must not be shorter than start_check_ms"
                    .into(),
            });
        }
        if self.remote.timeout_ms == 0 {
            return Err(ParloError::ConfigInvalid {
                reason: "speech.remote.timeout_ms must be greater than zero".into(),
            });
        }
        if !(1..=MAX_PROXY_TEXT_CHARS).contains(&self.remote.max_text_chars) {
            return Err(ParloError::ConfigInvalid {
                reason: format!(
                    "speech.remote.max_text_chars must be between 1 and {MAX_PROXY_TEXT_CHARS}"
                ),
            });
        }
        let endpoint = self.remote.endpoint.trim();
        if !endpoint.is_empty()
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ParloError::ConfigInvalid {
                reason: format!("speech.remote.endpoint is not an http(s) URL: {endpoint}"),
            });
        }
        Ok(())
    }
}

/// Host engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSpeechConfig {
    /// Try the host engine before the remote proxy.
    #[serde(default = "super::default_true")]
    pub enabled: bool,

    /// Fail fast if the host has not signalled start within this window.
    #[serde(default = "default_start_check_ms", alias = "startCheckMs")]
    pub start_check_ms: u64,

    /// Hard ceiling for a single utterance.
    #[serde(default = "default_max_utterance_ms", alias = "maxUtteranceMs")]
    pub max_utterance_ms: u64,

    /// Explicit engine binary for the command-line host (None = auto-detect).
    #[serde(default, alias = "engineBin")]
    pub engine_bin: Option<String>,

    /// Player fed the engine's WAV output on stdin (None = auto-detect).
    #[serde(default, alias = "playerBin")]
    pub player_bin: Option<String>,
}

fn default_start_check_ms() -> u64 {
    300
}
fn default_max_utterance_ms() -> u64 {
    12_000
}

impl Default for LocalSpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start_check_ms: default_start_check_ms(),
            max_utterance_ms: default_max_utterance_ms(),
            engine_bin: None,
            player_bin: None,
        }
    }
}

/// Remote TTS proxy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSpeechConfig {
    /// Use the remote proxy when the host engine fails.
    #[serde(default = "super::default_true")]
    pub enabled: bool,

    /// Proxy URL receiving `POST {text, lang}`. Empty = not configured.
    #[serde(default)]
    pub endpoint: String,

    /// Credential sent with every request. Takes precedence over
    /// `api_key_env`.
    #[serde(default, alias = "apiKey")]
    pub api_key: SecretString,

    /// Environment variable holding the credential.
    #[serde(default = "default_api_key_env", alias = "apiKeyEnv")]
    pub api_key_env: String,

    /// Extra headers forwarded verbatim.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Ceiling for request + playback, in milliseconds.
    #[serde(default = "default_remote_timeout_ms", alias = "timeoutMs")]
    pub timeout_ms: u64,

    /// Longest text sent to the proxy, in characters.
    #[serde(default = "default_max_text_chars", alias = "maxTextChars")]
    pub max_text_chars: usize,

    /// Explicit audio player binary (None = auto-detect).
    #[serde(default, alias = "playerBin")]
    pub player_bin: Option<String>,
}

fn default_api_key_env() -> String {
    "PARLO_TTS_API_KEY".into()
}
fn default_remote_timeout_ms() -> u64 {
    15_000
}
fn default_max_text_chars() -> usize {
    MAX_PROXY_TEXT_CHARS
}

impl RemoteSpeechConfig {
    /// `true` when a proxy endpoint is set and the fallback is enabled.
    pub fn is_configured(&self) -> bool {
        self.enabled && !self.endpoint.trim().is_empty()
    }

    /// The credential from config, else from `api_key_env`.
    pub fn resolve_api_key(&self) -> Option<SecretString> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        if self.api_key_env.is_empty() {
            return None;
        }
        SecretString::from_env(&self.api_key_env)
    }
}

impl Default for RemoteSpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: String::new(),
            api_key: SecretString::default(),
            api_key_env: default_api_key_env(),
            headers: HashMap::new(),
            timeout_ms: default_remote_timeout_ms(),
            max_text_chars: default_max_text_chars(),
            player_bin: None,
        }
    }
}

/// Default prosody.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceDefaults {
    /// Speaking rate multiplier (1.0 = normal).
    #[serde(default = "default_unit")]
    pub rate: f32,

    /// Pitch multiplier (1.0 = normal).
    #[serde(default = "default_unit")]
    pub pitch: f32,

    /// Output volume (0.0-1.0).
    #[serde(default = "default_unit")]
    pub volume: f32,
}

fn default_unit() -> f32 {
    1.0
}

impl Default for VoiceDefaults {
    fn default() -> Self {
        Self {
            rate: default_unit(),
            pitch: default_unit(),
            volume: default_unit(),
        }
    }
}
