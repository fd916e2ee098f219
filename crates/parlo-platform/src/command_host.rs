//! [`SpeechHost`] backed by the `espeak-ng` (or legacy `espeak`) binary.
//!
//! Each utterance runs the engine with `--stdout` and the text piped on
//! stdin, and relays the WAV it writes into a player process (`aplay`,
//! `paplay` or `ffplay` reading stdin). [`UtteranceEvent::Started`] is sent
//! when the first audio bytes reach the player, so an engine that never
//! produces sound never counts as started. Both processes exiting cleanly
//! is reported as [`UtteranceEvent::Ended`]; a new utterance or
//! [`SpeechHost::cancel`] kills them and reports
//! [`UtteranceError::Interrupted`].

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use parlo_types::VoiceDescriptor;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::HostError;
use crate::process::{NativeProcessSpawner, ProcessSpawner};
use crate::speech::{SpeechHost, Utterance, UtteranceError, UtteranceEvent, UtteranceEvents};

/// Binaries probed on `PATH`, in order of preference.
const ENGINE_CANDIDATES: &[&str] = &["espeak-ng", "espeak"];

/// Players that accept a WAV stream on stdin, in order of preference.
const SINK_CANDIDATES: &[&str] = &["aplay", "paplay", "ffplay"];

/// espeak's default speaking rate in words per minute.
const BASE_WPM: f32 = 175.0;

const VOICE_LIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Command-line speech engine.
pub struct CommandSpeechHost {
    binary: Option<PathBuf>,
    sink: Option<PathBuf>,
    spawner: Arc<dyn ProcessSpawner>,
    /// Kill switch for the utterance currently playing, if any.
    current: Mutex<Option<oneshot::Sender<()>>>,
}

impl CommandSpeechHost {
    /// Locate the engine and the player its audio is piped into.
    /// `preferred_engine` and `preferred_sink` (names or paths) replace
    /// the default probes.
    pub fn detect(preferred_engine: Option<&str>, preferred_sink: Option<&str>) -> Self {
        let binary = locate("speech engine", preferred_engine, ENGINE_CANDIDATES);
        let sink = locate("speech output player", preferred_sink, SINK_CANDIDATES);
        Self::with_binary(binary, Arc::new(NativeProcessSpawner)).with_sink(sink)
    }

    /// Build a host around an explicit binary and process spawner. No
    /// player is set; see [`with_sink`](Self::with_sink).
    pub fn with_binary(binary: Option<PathBuf>, spawner: Arc<dyn ProcessSpawner>) -> Self {
        Self {
            binary,
            sink: None,
            spawner,
            current: Mutex::new(None),
        }
    }

    /// Player that receives the engine's WAV output on stdin.
    pub fn with_sink(mut self, sink: Option<PathBuf>) -> Self {
        self.sink = sink;
        self
    }

    /// Path of the engine binary, when one was found.
    pub fn binary(&self) -> Option<&PathBuf> {
        self.binary.as_ref()
    }

    pub fn sink(&self) -> Option<&PathBuf> {
        self.sink.as_ref()
    }

    fn interrupt_current(&self) {
        let previous = match self.current.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(kill) = previous {
            let _ = kill.send(());
        }
    }

    fn install_kill_switch(&self, kill: oneshot::Sender<()>) {
        match self.current.lock() {
            Ok(mut slot) => *slot = Some(kill),
            Err(poisoned) => *poisoned.into_inner() = Some(kill),
        }
    }
}

fn locate(what: &str, preferred: Option<&str>, candidates: &[&str]) -> Option<PathBuf> {
    let found = match preferred {
        Some(name) => which::which(name)
            .inspect_err(|e| warn!(binary = name, error = %e, "configured {what} not found"))
            .ok(),
        None => candidates.iter().find_map(|name| which::which(name).ok()),
    };
    match &found {
        Some(path) => debug!(binary = %path.display(), "{what} detected"),
        None => debug!("no {what} on PATH"),
    }
    found
}

/// Player arguments for reading a WAV stream from stdin.
pub fn sink_args(sink: &Path) -> Vec<String> {
    let name = sink
        .file_stem()
        .map(|s| s.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let args: &[&str] = match name.as_str() {
        "aplay" => &["-q", "-"],
        "ffplay" => &["-nodisp", "-autoexit", "-loglevel", "quiet", "-"],
        _ => &[],
    };
    args.iter().map(|a| a.to_string()).collect()
}

/// espeak command-line arguments for an utterance (text goes on stdin).
pub fn engine_args(utterance: &Utterance) -> Vec<String> {
    let voice = utterance
        .voice
        .as_ref()
        .map(|v| v.identifier.clone())
        .unwrap_or_else(|| parlo_types::voice::normalize_tag(&utterance.language_tag));
    let wpm = (BASE_WPM * utterance.rate).round().clamp(80.0, 450.0) as u32;
    let pitch = (50.0 * utterance.pitch).round().clamp(0.0, 99.0) as u32;
    let amplitude = (100.0 * utterance.volume).round().clamp(0.0, 200.0) as u32;

    vec![
        "-v".into(),
        voice,
        "-s".into(),
        wpm.to_string(),
        "-p".into(),
        pitch.to_string(),
        "-a".into(),
        amplitude.to_string(),
        "--stdout".into(),
        "--stdin".into(),
    ]
}

/// Parse the table printed by `espeak-ng --voices`.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  es-419          --/M      Spanish_(Latin_America) roa/es-419     (es-mx 6)
/// ```
///
/// The language column doubles as the identifier since `-v <language>`
/// selects the voice. Duplicate languages keep their first row.
pub fn parse_voice_list(output: &str) -> Vec<VoiceDescriptor> {
    let mut voices: Vec<VoiceDescriptor> = Vec::new();
    for line in output.lines().skip(1) {
        let mut cols = line.split_whitespace();
        let (Some(_priority), Some(language)) = (cols.next(), cols.next()) else {
            continue;
        };
        if voices.iter().any(|v| v.identifier == language) {
            continue;
        }
        voices.push(VoiceDescriptor::new(language, language));
    }
    voices
}

#[async_trait]
impl SpeechHost for CommandSpeechHost {
    fn name(&self) -> &str {
        "command"
    }

    fn is_supported(&self) -> bool {
        self.binary.is_some() && self.sink.is_some()
    }

    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, HostError> {
        let Some(binary) = &self.binary else {
            return Err(HostError::Unsupported("no speech engine binary".into()));
        };
        let program = binary.to_string_lossy();
        let output = self
            .spawner
            .run(&program, &["--voices"], VOICE_LIST_TIMEOUT)
            .await
            .map_err(|e| HostError::Engine(e.to_string()))?;
        if !output.success() {
            return Err(HostError::Engine(format!(
                "{program} --voices exited with {}: {}",
                output.exit_code,
                output.stderr.trim()
            )));
        }
        Ok(parse_voice_list(&output.stdout))
    }

    fn voices_changed(&self) -> Option<broadcast::Receiver<()>> {
        None
    }

    fn speak(&self, utterance: Utterance) -> Result<UtteranceEvents, HostError> {
        let (Some(binary), Some(sink)) = (&self.binary, &self.sink) else {
            return Err(HostError::Unsupported(
                "speech engine or output player missing".into(),
            ));
        };

        self.interrupt_current();

        let engine = Command::new(binary)
            .args(engine_args(&utterance))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        let player = Command::new(sink)
            .args(sink_args(sink))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let (events, rx) = mpsc::unbounded_channel();
        let (kill_tx, kill_rx) = oneshot::channel();
        self.install_kill_switch(kill_tx);

        tokio::spawn(async move {
            let terminal = tokio::select! {
                terminal = run_pipeline(engine, player, utterance.text, &events) => terminal,
                // Dropping the pipeline kills both children.
                _ = kill_rx => UtteranceEvent::Failed(UtteranceError::Interrupted),
            };
            let _ = events.send(terminal);
        });

        Ok(rx)
    }

    fn cancel(&self) {
        self.interrupt_current();
    }
}

/// Feed `text` to the engine, relay its audio into the player and wait
/// for both to exit.
async fn run_pipeline(
    mut engine: Child,
    mut player: Child,
    text: String,
    events: &mpsc::UnboundedSender<UtteranceEvent>,
) -> UtteranceEvent {
    let (Some(mut engine_in), Some(audio), Some(player_in)) =
        (engine.stdin.take(), engine.stdout.take(), player.stdin.take())
    else {
        return failed("speech pipeline is missing a pipe");
    };

    let feed = async move {
        if let Err(e) = engine_in.write_all(text.as_bytes()).await {
            debug!(error = %e, "failed to pipe text to speech engine");
        }
    };
    let ((), relayed) = tokio::join!(feed, relay_audio(audio, player_in, events));
    if let Err(e) = relayed {
        return failed(format!("audio relay failed: {e}"));
    }

    match engine.wait().await {
        Ok(status) if status.success() => {}
        Ok(status) => return failed(format!("engine exited with {status}")),
        Err(e) => return failed(e.to_string()),
    }
    match player.wait().await {
        Ok(status) if status.success() => UtteranceEvent::Ended,
        Ok(status) => failed(format!("player exited with {status}")),
        Err(e) => failed(e.to_string()),
    }
}

/// Copy engine output into the player, sending `Started` with the first
/// chunk. Closes the player's stdin when the engine's stdout ends.
async fn relay_audio(
    mut audio: impl AsyncRead + Unpin,
    mut player_in: impl AsyncWrite + Unpin,
    events: &mpsc::UnboundedSender<UtteranceEvent>,
) -> std::io::Result<()> {
    let mut buf = vec![0u8; 8 * 1024];
    let mut started = false;
    loop {
        let n = audio.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        player_in.write_all(&buf[..n]).await?;
        if !started {
            started = true;
            let _ = events.send(UtteranceEvent::Started);
        }
    }
    player_in.shutdown().await
}

fn failed(reason: impl Into<String>) -> UtteranceEvent {
    UtteranceEvent::Failed(UtteranceError::Other(reason.into()))
}
