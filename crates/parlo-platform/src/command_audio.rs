//! [`AudioOutput`] that plays clips through an external player binary.
//!
//! `load` writes the bytes to a uniquely named temp file, `play` runs the
//! player on it, and `release` stops the player and deletes the file.
//! A `load` dropped before it returns a handle deletes its own file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::audio::{AudioHandle, AudioOutput};
use crate::error::HostError;

/// Players probed on `PATH`, in order of preference.
const PLAYER_CANDIDATES: &[&str] = &["ffplay", "mpg123", "paplay"];

struct Clip {
    path: PathBuf,
    stop: Option<oneshot::Sender<()>>,
}

/// Temp-file + player-process audio output.
pub struct CommandAudioOutput {
    player: Option<PathBuf>,
    clip_dir: PathBuf,
    clips: Mutex<HashMap<AudioHandle, Clip>>,
}

impl CommandAudioOutput {
    /// Locate a player. `preferred` (a name or path) replaces the default
    /// `ffplay`, `mpg123`, `paplay` probe.
    pub fn detect(preferred: Option<&str>) -> Self {
        let player = match preferred {
            Some(name) => which::which(name)
                .inspect_err(|e| warn!(player = name, error = %e, "configured audio player not found"))
                .ok(),
            None => PLAYER_CANDIDATES
                .iter()
                .find_map(|name| which::which(name).ok()),
        };
        match &player {
            Some(path) => debug!(player = %path.display(), "audio player detected"),
            None => debug!("no audio player on PATH"),
        }
        Self::with_player(player)
    }

    pub fn with_player(player: Option<PathBuf>) -> Self {
        Self {
            player,
            clip_dir: std::env::temp_dir(),
            clips: Mutex::new(HashMap::new()),
        }
    }

    /// Write clips under `dir` instead of the system temp directory.
    pub fn with_clip_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.clip_dir = dir.into();
        self
    }

    /// Number of clips loaded and not yet released.
    pub fn loaded_count(&self) -> usize {
        self.lock_clips().len()
    }

    fn lock_clips(&self) -> std::sync::MutexGuard<'_, HashMap<AudioHandle, Clip>> {
        match self.clips.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// File extension for a MIME type, so players can sniff the container.
fn extension_for(mime_type: &str) -> &'static str {
    match mime_type.to_ascii_lowercase().as_str() {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/ogg" | "audio/opus" => "ogg",
        "audio/aac" => "aac",
        _ => "bin",
    }
}

/// Player arguments for a clip, keyed on the player's file name.
fn player_args(player: &Path, clip: &Path) -> Vec<String> {
    let clip = clip.to_string_lossy().into_owned();
    let name = player
        .file_stem()
        .map(|s| s.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match name.as_str() {
        "ffplay" => vec![
            "-nodisp".into(),
            "-autoexit".into(),
            "-loglevel".into(),
            "quiet".into(),
            clip,
        ],
        "mpg123" => vec!["-q".into(), clip],
        _ => vec![clip],
    }
}

#[async_trait]
impl AudioOutput for CommandAudioOutput {
    async fn load(&self, audio: &[u8], mime_type: &str) -> Result<AudioHandle, HostError> {
        if self.player.is_none() {
            return Err(HostError::Unsupported("no audio player binary".into()));
        }
        if audio.is_empty() {
            return Err(HostError::InvalidAudio("empty audio body".into()));
        }

        let path = self.clip_dir.join(format!(
            "parlo-{}.{}",
            uuid::Uuid::new_v4(),
            extension_for(mime_type)
        ));

        // The writer owns the file until this future takes it back; if the
        // future is gone by then, nobody holds a handle to release it.
        let (written_tx, written_rx) = oneshot::channel();
        let target = path.clone();
        let bytes = audio.to_vec();
        tokio::task::spawn_blocking(move || {
            let written = std::fs::write(&target, &bytes);
            if written_tx.send(written).is_err() {
                let _ = std::fs::remove_file(&target);
            }
        });
        match written_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = std::fs::remove_file(&path);
                return Err(e.into());
            }
            Err(_) => return Err(HostError::Engine("audio clip writer stopped".into())),
        }

        let handle = AudioHandle::next();
        debug!(handle = handle.id(), path = %path.display(), bytes = audio.len(), "audio clip loaded");
        self.lock_clips().insert(handle, Clip { path, stop: None });
        Ok(handle)
    }

    async fn play(&self, handle: &AudioHandle) -> Result<(), HostError> {
        let Some(player) = &self.player else {
            return Err(HostError::Unsupported("no audio player binary".into()));
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        let path = {
            let mut clips = self.lock_clips();
            let clip = clips
                .get_mut(handle)
                .ok_or(HostError::UnknownHandle(handle.id()))?;
            clip.stop = Some(stop_tx);
            clip.path.clone()
        };

        let mut child = tokio::process::Command::new(player)
            .args(player_args(player, &path))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                if status.success() {
                    Ok(())
                } else {
                    Err(HostError::Engine(format!("player exited with {status}")))
                }
            }
            _ = stop_rx => {
                let _ = child.kill().await;
                Err(HostError::Engine("playback stopped".into()))
            }
        }
    }

    fn release(&self, handle: &AudioHandle) {
        let Some(clip) = self.lock_clips().remove(handle) else {
            return;
        };
        if let Some(stop) = clip.stop {
            let _ = stop.send(());
        }
        if let Err(e) = std::fs::remove_file(&clip.path) {
            debug!(path = %clip.path.display(), error = %e, "failed to remove audio clip");
        }
        debug!(handle = handle.id(), "audio clip released");
    }
}
