//! Per-call request data and attempt outcomes.

use parlo_types::config::VoiceDefaults;

/// Caller-supplied voice options. `None` fields take the configured
/// [`VoiceDefaults`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpeakOptions {
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub volume: Option<f32>,
}

impl SpeakOptions {
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = Some(volume);
        self
    }
}

/// One validated `speak` call. Built per call, consumed by the drivers.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakRequest {
    /// Trimmed, never empty.
    pub text: String,
    pub language_code: String,
    /// 0.1 to 10.0.
    pub rate: f32,
    /// 0.0 to 2.0.
    pub pitch: f32,
    /// 0.0 to 1.0.
    pub volume: f32,
}

impl SpeakRequest {
    /// Build a request, or `None` when `text` is empty after trimming.
    ///
    /// Non-finite option values fall back to the defaults; finite ones are
    /// clamped into range.
    pub fn new(
        text: &str,
        language_code: &str,
        options: SpeakOptions,
        defaults: &VoiceDefaults,
    ) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            language_code: language_code.trim().to_string(),
            rate: pick(options.rate, defaults.rate, 1.0).clamp(0.1, 10.0),
            pitch: pick(options.pitch, defaults.pitch, 1.0).clamp(0.0, 2.0),
            volume: pick(options.volume, defaults.volume, 1.0).clamp(0.0, 1.0),
        })
    }
}

fn pick(requested: Option<f32>, configured: f32, fallback: f32) -> f32 {
    requested
        .filter(|v| v.is_finite())
        .or(Some(configured).filter(|v| v.is_finite()))
        .unwrap_or(fallback)
}

/// How a single driver attempt settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Succeeded,
    Failed,
    TimedOut,
}

impl std::fmt::Display for PlaybackOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::TimedOut => write!(f, "timed_out"),
        }
    }
}
