//! Local synthesis driver.
//!
//! Speaks one utterance on the host engine and decides whether it
//! "worked". Host events race two timers:
//!
//! - the **start check** (300 ms by default) fails the attempt only if no
//!   `Started`/`Activity` event has been seen by then;
//! - the **ceiling** (12 s by default, counted from the start of the
//!   attempt) ends the wait and reports whatever start state was observed.
//!
//! The voice lookup before the host call is bounded by the start check
//! and by cancellation, so a host that never lists its voices still gets
//! the utterance with its default voice.
//!
//! Whichever settles first decides; everything after is ignored because
//! the attempt is a single future that returns once.

use std::sync::Arc;
use std::time::Duration;

use parlo_platform::speech::{SpeechHost, Utterance, UtteranceEvent, UtteranceEvents};
use parlo_types::config::LocalSpeechConfig;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::catalog::VoiceCatalog;
use crate::request::{PlaybackOutcome, SpeakRequest};

/// Timer settings for [`LocalDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDriverConfig {
    pub start_check: Duration,
    pub max_utterance: Duration,
}

impl Default for LocalDriverConfig {
    fn default() -> Self {
        Self {
            start_check: Duration::from_millis(300),
            max_utterance: Duration::from_secs(12),
        }
    }
}

impl From<&LocalSpeechConfig> for LocalDriverConfig {
    fn from(config: &LocalSpeechConfig) -> Self {
        Self {
            start_check: Duration::from_millis(config.start_check_ms),
            max_utterance: Duration::from_millis(config.max_utterance_ms),
        }
    }
}

/// Drives the host's native engine for one utterance at a time.
pub struct LocalDriver {
    host: Arc<dyn SpeechHost>,
    catalog: Arc<VoiceCatalog>,
    config: LocalDriverConfig,
}

impl LocalDriver {
    pub fn new(
        host: Arc<dyn SpeechHost>,
        catalog: Arc<VoiceCatalog>,
        config: LocalDriverConfig,
    ) -> Self {
        Self {
            host,
            catalog,
            config,
        }
    }

    /// Speak `request` locally. `true` means the caller should not fall
    /// back: the utterance played, or was superseded by a newer one.
    pub async fn try_speak(&self, request: &SpeakRequest, cancel: &CancellationToken) -> bool {
        let (outcome, started) = self.attempt(request, cancel).await;
        match outcome {
            PlaybackOutcome::Succeeded => true,
            PlaybackOutcome::Failed => false,
            PlaybackOutcome::TimedOut => started,
        }
    }

    /// Run one attempt and report how it settled plus whether the host
    /// ever signalled a start.
    pub async fn attempt(
        &self,
        request: &SpeakRequest,
        cancel: &CancellationToken,
    ) -> (PlaybackOutcome, bool) {
        if !self.host.is_supported() {
            debug!(host = self.host.name(), "local speech unsupported");
            return (PlaybackOutcome::Failed, false);
        }

        let ceiling = Instant::now() + self.config.max_utterance;
        self.host.cancel();

        // The lookup may hit the host; it gets the start-check window and
        // falls back to the host's default voice when that runs out.
        let voice = tokio::select! {
            biased;

            _ = cancel.cancelled() => return (PlaybackOutcome::Succeeded, false),
            found = tokio::time::timeout(
                self.config.start_check,
                self.catalog.best_match(&request.language_code),
            ) => found.unwrap_or_else(|_| {
                debug!(language = %request.language_code, "voice lookup timed out, using host default");
                None
            }),
        };

        debug!(
            language = %request.language_code,
            voice = voice.as_ref().map(|v| v.identifier.as_str()).unwrap_or("<default>"),
            "speaking locally"
        );
        let utterance = Utterance {
            text: request.text.clone(),
            language_tag: request.language_code.clone(),
            voice,
            rate: request.rate,
            pitch: request.pitch,
            volume: request.volume,
        };

        let events = match self.host.speak(utterance) {
            Ok(events) => events,
            Err(e) => {
                debug!(error = %e, "host refused utterance");
                return (PlaybackOutcome::Failed, false);
            }
        };

        let (outcome, started) = settle(events, cancel, self.config.start_check, ceiling).await;
        debug!(%outcome, started, "local attempt settled");
        (outcome, started)
    }
}

/// Race host events against the start check, the ceiling and cancellation.
async fn settle(
    mut events: UtteranceEvents,
    cancel: &CancellationToken,
    start_check: Duration,
    ceiling: Instant,
) -> (PlaybackOutcome, bool) {
    let start_check = tokio::time::sleep(start_check);
    let ceiling = tokio::time::sleep_until(ceiling);
    tokio::pin!(start_check, ceiling);

    let mut started = false;
    let mut checking_start = true;

    loop {
        tokio::select! {
            // Events already queued are seen before a timer that fired in
            // the same poll.
            biased;

            event = events.recv() => match event {
                Some(UtteranceEvent::Started | UtteranceEvent::Activity) => started = true,
                Some(UtteranceEvent::Ended) => return (PlaybackOutcome::Succeeded, started),
                Some(UtteranceEvent::Failed(e)) if e.is_supersession() => {
                    debug!(reason = %e, "utterance superseded");
                    return (PlaybackOutcome::Succeeded, started);
                }
                Some(UtteranceEvent::Failed(e)) => {
                    debug!(reason = %e, "utterance failed");
                    return (PlaybackOutcome::Failed, started);
                }
                None => {
                    // Host dropped the stream without a terminal event.
                    let outcome = if started {
                        PlaybackOutcome::Succeeded
                    } else {
                        PlaybackOutcome::Failed
                    };
                    return (outcome, started);
                }
            },
            _ = cancel.cancelled() => return (PlaybackOutcome::Succeeded, started),
            _ = &mut start_check, if checking_start => {
                if !started {
                    return (PlaybackOutcome::TimedOut, false);
                }
                checking_start = false;
            }
            _ = &mut ceiling => return (PlaybackOutcome::TimedOut, started),
        }
    }
}
