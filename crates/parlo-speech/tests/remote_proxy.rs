//! Remote TTS proxy tests against a local mock server.
//!
//! Drives [`SpeechEngine`] on a host with no speech engine, so every
//! `speak` goes through the real reqwest client to [`wiremock`].
//!
//! Coverage:
//! - 200 `audio/mpeg` is loaded, played and released once
//! - request body carries the primary subtag and truncated text
//! - credential and custom headers are forwarded
//! - 4xx/5xx responses are swallowed without touching audio output
//! - a slow proxy is abandoned at the configured ceiling
//! - a command-line engine that never produces audio falls back

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use parlo_platform::HostError;
use parlo_platform::audio::{AudioHandle, AudioOutput};
use parlo_platform::command_host::CommandSpeechHost;
use parlo_platform::http::NativeHttpClient;
use parlo_platform::process::NativeProcessSpawner;
use parlo_speech::{PlaybackState, SpeakOptions, SpeechEngine};
use parlo_types::SecretString;
use parlo_types::config::SpeechConfig;

const MP3: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00fake-frames";

/// Audio output that records loads and counts releases per handle.
#[derive(Default)]
struct RecordingAudio {
    loads: Mutex<Vec<(Vec<u8>, String)>>,
    plays: AtomicUsize,
    releases: Mutex<HashMap<AudioHandle, usize>>,
}

#[async_trait]
impl AudioOutput for RecordingAudio {
    async fn load(&self, audio: &[u8], mime_type: &str) -> Result<AudioHandle, HostError> {
        self.loads
            .lock()
            .unwrap()
            .push((audio.to_vec(), mime_type.to_string()));
        Ok(AudioHandle::next())
    }

    async fn play(&self, _handle: &AudioHandle) -> Result<(), HostError> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self, handle: &AudioHandle) {
        *self.releases.lock().unwrap().entry(*handle).or_insert(0) += 1;
    }
}

fn proxy_config(server_url: &str) -> SpeechConfig {
    let mut config = SpeechConfig::default();
    config.remote.endpoint = format!("{server_url}/functions/v1/tts");
    config.remote.api_key = SecretString::new("anon-test-key");
    config
        .remote
        .headers
        .insert("x-client-info".into(), "parlo-tests".into());
    config
}

fn engine(config: &SpeechConfig, audio: Arc<RecordingAudio>) -> SpeechEngine {
    let host = Arc::new(CommandSpeechHost::with_binary(
        None::<PathBuf>,
        Arc::new(NativeProcessSpawner),
    ));
    SpeechEngine::from_parts(config, host, Arc::new(NativeHttpClient::new()), audio)
}

// ── Success ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn proxy_audio_is_played_and_released() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/functions/v1/tts"))
        .and(body_json(serde_json::json!({"text": "Hola", "lang": "es"})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(MP3),
        )
        .expect(1)
        .mount(&server)
        .await;

    let audio = Arc::new(RecordingAudio::default());
    let engine = engine(&proxy_config(&server.uri()), audio.clone());

    let begun = Instant::now();
    engine
        .speak("Hola", "es-MX", SpeakOptions::default().with_rate(0.8))
        .await;
    assert!(begun.elapsed() < Duration::from_secs(15));

    let loads = audio.loads.lock().unwrap().clone();
    assert_eq!(loads.len(), 1);
    assert_eq!(loads[0].0, MP3);
    assert_eq!(loads[0].1, "audio/mpeg");
    assert_eq!(audio.plays.load(Ordering::SeqCst), 1);
    let releases: Vec<usize> = audio.releases.lock().unwrap().values().copied().collect();
    assert_eq!(releases, [1]);
    assert_eq!(engine.current_state(), PlaybackState::Idle);
}

#[tokio::test]
async fn credential_and_custom_headers_forwarded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("authorization", "Bearer anon-test-key"))
        .and(header("apikey", "anon-test-key"))
        .and(header("x-client-info", "parlo-tests"))
        .and(header("content-type", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(MP3),
        )
        .expect(1)
        .mount(&server)
        .await;

    let audio = Arc::new(RecordingAudio::default());
    engine(&proxy_config(&server.uri()), audio.clone())
        .speak("Bonjour", "fr-FR", SpeakOptions::default())
        .await;

    assert_eq!(audio.plays.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn long_text_is_truncated() {
    let server = MockServer::start().await;
    let long = "palabra ".repeat(40);
    let expected: String = long.trim().chars().take(200).collect();

    Mock::given(method("POST"))
        .and(body_json(serde_json::json!({"text": expected, "lang": "es"})))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(MP3))
        .expect(1)
        .mount(&server)
        .await;

    let audio = Arc::new(RecordingAudio::default());
    engine(&proxy_config(&server.uri()), audio.clone())
        .speak(&long, "es", SpeakOptions::default())
        .await;

    // No content-type on the response: assumed MP3.
    assert_eq!(audio.loads.lock().unwrap()[0].1, "audio/mpeg");
}

// ── Failures are swallowed ──────────────────────────────────────────────

#[tokio::test]
async fn server_error_is_swallowed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(serde_json::json!({"error": "TTS provider unavailable"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let audio = Arc::new(RecordingAudio::default());
    let engine = engine(&proxy_config(&server.uri()), audio.clone());
    engine.speak("Hola", "es", SpeakOptions::default()).await;

    assert!(audio.loads.lock().unwrap().is_empty());
    assert_eq!(engine.current_state(), PlaybackState::Idle);
}

#[tokio::test]
async fn unauthorized_is_swallowed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .expect(1)
        .mount(&server)
        .await;

    let audio = Arc::new(RecordingAudio::default());
    engine(&proxy_config(&server.uri()), audio.clone())
        .speak("Hola", "es", SpeakOptions::default())
        .await;

    assert!(audio.loads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn slow_proxy_hits_ceiling() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(MP3)
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let mut config = proxy_config(&server.uri());
    config.remote.timeout_ms = 200;
    let audio = Arc::new(RecordingAudio::default());
    let engine = engine(&config, audio.clone());

    let begun = Instant::now();
    engine.speak("Hola", "es", SpeakOptions::default()).await;
    assert!(begun.elapsed() < Duration::from_secs(3));
    assert!(audio.loads.lock().unwrap().is_empty());
    assert_eq!(engine.current_state(), PlaybackState::Idle);
}

#[tokio::test]
async fn blank_text_never_calls_proxy() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(MP3))
        .expect(0)
        .mount(&server)
        .await;

    let audio = Arc::new(RecordingAudio::default());
    engine(&proxy_config(&server.uri()), audio)
        .speak("  \t ", "es", SpeakOptions::default())
        .await;
}

// ── Command-line engine ─────────────────────────────────────────────────

/// Fake espeak: lists one Spanish voice, otherwise runs `speak_body`.
#[cfg(unix)]
fn command_host(dir: &std::path::Path, speak_body: &str) -> Arc<CommandSpeechHost> {
    use std::os::unix::fs::PermissionsExt;

    let write_script = |name: &str, body: String| {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    };
    let engine = write_script(
        "fake-espeak",
        format!(
            "if [ \"$1\" = \"--voices\" ]; then\n\
             echo 'Pty Language Age/Gender VoiceName File Other Languages'\n\
             echo ' 5  es  --/M  Spanish  roa/es'\n\
             exit 0\n\
             fi\n\
             {speak_body}"
        ),
    );
    let sink = write_script("fake-player", "cat > /dev/null".into());
    Arc::new(
        CommandSpeechHost::with_binary(Some(engine), Arc::new(NativeProcessSpawner))
            .with_sink(Some(sink)),
    )
}

/// Timers short enough to watch the start check fire.
#[cfg(unix)]
fn fast_local(mut config: SpeechConfig) -> SpeechConfig {
    config.local.start_check_ms = 50;
    config.local.max_utterance_ms = 800;
    config
}

#[cfg(unix)]
#[tokio::test]
async fn silent_command_engine_falls_back_to_proxy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/functions/v1/tts"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(MP3),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let audio = Arc::new(RecordingAudio::default());
    let engine = SpeechEngine::from_parts(
        &fast_local(proxy_config(&server.uri())),
        command_host(dir.path(), "exec sleep 30"),
        Arc::new(NativeHttpClient::new()),
        audio.clone(),
    );

    let begun = Instant::now();
    engine.speak("Hola", "es", SpeakOptions::default()).await;
    assert!(begun.elapsed() < Duration::from_secs(3));
    assert_eq!(audio.plays.load(Ordering::SeqCst), 1);
    engine.cancel();
}

#[cfg(unix)]
#[tokio::test]
async fn audible_command_engine_skips_proxy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let audio = Arc::new(RecordingAudio::default());
    let mut config = proxy_config(&server.uri());
    config.local.start_check_ms = 1_000;
    config.local.max_utterance_ms = 5_000;
    let engine = SpeechEngine::from_parts(
        &config,
        command_host(dir.path(), "cat > /dev/null\nprintf 'RIFF....WAVEfmt '"),
        Arc::new(NativeHttpClient::new()),
        audio.clone(),
    );

    engine.speak("Hola", "es", SpeakOptions::default()).await;
    assert!(audio.loads.lock().unwrap().is_empty());
    assert_eq!(engine.current_state(), PlaybackState::Idle);
}
