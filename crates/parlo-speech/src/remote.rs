//! Remote synthesis fallback.
//!
//! Posts `{ "text", "lang" }` to the TTS proxy, plays the returned audio
//! and releases it. Nothing here returns an error to the caller: every
//! failure is logged and the call simply ends.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parlo_platform::audio::{AudioHandle, AudioOutput};
use parlo_platform::http::{HttpClient, HttpResponse};
use parlo_types::config::RemoteSpeechConfig;
use parlo_types::voice::primary_subtag;
use tracing::{debug, warn};

use crate::error::{Result, SpeechError};
use crate::request::PlaybackOutcome;

/// MIME type assumed when the proxy omits `content-type`.
const DEFAULT_AUDIO_MIME: &str = "audio/mpeg";

/// Longest error body excerpt carried into logs.
const ERROR_EXCERPT_CHARS: usize = 200;

/// Fetch-and-play client for the remote TTS proxy.
pub struct RemoteFallback {
    config: RemoteSpeechConfig,
    http: Arc<dyn HttpClient>,
    audio: Arc<dyn AudioOutput>,
}

impl RemoteFallback {
    pub fn new(
        config: RemoteSpeechConfig,
        http: Arc<dyn HttpClient>,
        audio: Arc<dyn AudioOutput>,
    ) -> Self {
        Self {
            config,
            http,
            audio,
        }
    }

    /// Whether a proxy endpoint is set and the fallback is enabled.
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Best-effort: fetch audio for `text` and play it. Never fails.
    pub async fn play(&self, text: &str, language_tag: &str) {
        self.play_with_outcome(text, language_tag).await;
    }

    /// Like [`play`](Self::play), but reports how the attempt settled.
    pub async fn play_with_outcome(&self, text: &str, language_tag: &str) -> PlaybackOutcome {
        if !self.is_configured() {
            debug!(error = %SpeechError::NotConfigured, "skipping remote playback");
            return PlaybackOutcome::Failed;
        }

        let ceiling = Duration::from_millis(self.config.timeout_ms);
        let begun = Instant::now();

        match tokio::time::timeout(ceiling, self.fetch_and_play(text, language_tag)).await {
            Ok(Ok(())) => {
                debug!(
                    language = language_tag,
                    elapsed_ms = begun.elapsed().as_millis() as u64,
                    "remote playback finished"
                );
                PlaybackOutcome::Succeeded
            }
            Ok(Err(e)) => {
                warn!(language = language_tag, error = %e, "remote playback failed");
                PlaybackOutcome::Failed
            }
            Err(_) => {
                warn!(
                    language = language_tag,
                    error = %SpeechError::Timeout(self.config.timeout_ms),
                    "remote playback abandoned"
                );
                PlaybackOutcome::TimedOut
            }
        }
    }

    /// JSON body sent to the proxy.
    pub fn request_body(&self, text: &str, language_tag: &str) -> serde_json::Value {
        serde_json::json!({
            "text": truncate_chars(text, self.config.max_text_chars),
            "lang": primary_subtag(language_tag),
        })
    }

    /// Headers sent to the proxy: configured extras, then the credential.
    pub fn request_headers(&self) -> HashMap<String, String> {
        let mut headers = self.config.headers.clone();
        headers.insert("content-type".into(), "application/json".into());
        if let Some(key) = self.config.resolve_api_key() {
            headers.insert("authorization".into(), format!("Bearer {}", key.expose()));
            headers.insert("apikey".into(), key.expose().to_string());
        }
        headers
    }

    async fn fetch_and_play(&self, text: &str, language_tag: &str) -> Result<()> {
        let body = self.request_body(text, language_tag);
        let response = self
            .http
            .post_json(&self.config.endpoint, &self.request_headers(), &body)
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;

        if !response.is_success() {
            return Err(SpeechError::ProxyStatus {
                status: response.status,
                body: error_excerpt(&response),
            });
        }
        if response.body.is_empty() {
            return Err(SpeechError::InvalidAudio("empty body".into()));
        }
        let mime_type = response.content_type().unwrap_or(DEFAULT_AUDIO_MIME);
        if mime_type.eq_ignore_ascii_case("application/json") {
            return Err(SpeechError::InvalidAudio(error_excerpt(&response)));
        }

        debug!(bytes = response.body.len(), mime_type, "proxy audio received");
        let handle = self.audio.load(&response.body, mime_type).await?;
        let guard = ReleaseGuard::new(self.audio.clone(), handle);
        let played = self.audio.play(guard.handle()).await;
        guard.release();
        played.map_err(Into::into)
    }
}

/// Releases an audio handle exactly once: explicitly, or on drop when the
/// surrounding future is abandoned by the timeout.
struct ReleaseGuard {
    audio: Arc<dyn AudioOutput>,
    handle: AudioHandle,
    released: AtomicBool,
}

impl ReleaseGuard {
    fn new(audio: Arc<dyn AudioOutput>, handle: AudioHandle) -> Self {
        Self {
            audio,
            handle,
            released: AtomicBool::new(false),
        }
    }

    fn handle(&self) -> &AudioHandle {
        &self.handle
    }

    fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.audio.release(&self.handle);
        }
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// First `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Short description of an error response: the JSON `error`/`message`
/// field when present, else the start of the body.
fn error_excerpt(response: &HttpResponse) -> String {
    if let Ok(value) = response.json::<serde_json::Value>() {
        for field in ["error", "message"] {
            if let Some(msg) = value.get(field).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    truncate_chars(&response.text_lossy(), ERROR_EXCERPT_CHARS).to_string()
}
