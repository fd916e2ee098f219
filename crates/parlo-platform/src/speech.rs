//! Native speech engine capability.
//!
//! Hosts report utterance progress the way platform speech APIs do: as a
//! stream of callbacks (start, boundary, end, error). [`SpeechHost::speak`]
//! exposes that stream as an unbounded channel of [`UtteranceEvent`]s,
//! delivered in host order. Consumers decide when an attempt has settled;
//! the host keeps no notion of success.

use async_trait::async_trait;
use parlo_types::VoiceDescriptor;
use tokio::sync::{broadcast, mpsc};

use crate::error::HostError;

/// A single request handed to the host engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// Text to speak. Already trimmed and non-empty.
    pub text: String,
    /// Requested language tag (used when no voice was resolved).
    pub language_tag: String,
    /// Voice bound to this utterance, if the catalog found one.
    pub voice: Option<VoiceDescriptor>,
    /// Rate multiplier (1.0 = normal).
    pub rate: f32,
    /// Pitch multiplier (1.0 = normal).
    pub pitch: f32,
    /// Volume (0.0-1.0).
    pub volume: f32,
}

/// Why the host ended an utterance without completing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceError {
    /// Another utterance or a cancel superseded this one.
    Interrupted,
    /// The utterance was cancelled before it started.
    Canceled,
    /// Any other engine error (`"synthesis-failed"`, `"voice-unavailable"`,
    /// `"audio-busy"`, ...).
    Other(String),
}

impl UtteranceError {
    /// Interruption and cancellation mean a newer request took over.
    pub fn is_supersession(&self) -> bool {
        matches!(self, Self::Interrupted | Self::Canceled)
    }
}

impl std::fmt::Display for UtteranceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interrupted => write!(f, "interrupted"),
            Self::Canceled => write!(f, "canceled"),
            Self::Other(reason) => write!(f, "{reason}"),
        }
    }
}

/// One host callback for an utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceEvent {
    /// Audio output began.
    Started,
    /// Word/sentence boundary or any other sign of life.
    Activity,
    /// Normal completion.
    Ended,
    /// The host gave up on the utterance.
    Failed(UtteranceError),
}

impl UtteranceEvent {
    /// `true` for events after which the host sends nothing further.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended | Self::Failed(_))
    }
}

/// Receiving end of an utterance's callback stream.
pub type UtteranceEvents = mpsc::UnboundedReceiver<UtteranceEvent>;

/// The host platform's native speech engine.
#[async_trait]
pub trait SpeechHost: Send + Sync {
    /// Short engine name used in logs.
    fn name(&self) -> &str;

    /// Whether the platform has a usable speech engine at all.
    fn is_supported(&self) -> bool;

    /// Fetch the current voice set from the host.
    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, HostError>;

    /// Subscribe to "voice catalog changed" notifications.
    ///
    /// Returns `None` when the host never changes its catalog at runtime.
    fn voices_changed(&self) -> Option<broadcast::Receiver<()>>;

    /// Start speaking. Returns immediately; progress arrives on the
    /// returned channel. An `Err` means the host refused the request.
    fn speak(&self, utterance: Utterance) -> Result<UtteranceEvents, HostError>;

    /// Stop whatever the host is currently saying. Fire-and-forget.
    fn cancel(&self);
}
