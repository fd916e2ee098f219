//! Voice catalog cache.
//!
//! Holds the host's voice list, loaded on first use and replaced wholesale
//! on every refresh. The first load also subscribes to the host's
//! "voices changed" notifications; each notification triggers a full
//! re-fetch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, Weak};

use parlo_platform::speech::SpeechHost;
use parlo_types::VoiceDescriptor;
use parlo_types::voice::{normalize_tag, primary_subtag};
use tokio::sync::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

/// Cached view of the host's voices.
pub struct VoiceCatalog {
    host: Arc<dyn SpeechHost>,
    /// `None` until the first successful fetch.
    voices: RwLock<Option<Arc<Vec<VoiceDescriptor>>>>,
    /// Serializes fetches so an older result never overwrites a newer one.
    fetch_lock: Mutex<()>,
    listening: AtomicBool,
}

impl VoiceCatalog {
    pub fn new(host: Arc<dyn SpeechHost>) -> Arc<Self> {
        Arc::new(Self {
            host,
            voices: RwLock::new(None),
            fetch_lock: Mutex::new(()),
            listening: AtomicBool::new(false),
        })
    }

    /// Re-fetch the whole voice list from the host and replace the cache.
    ///
    /// A host error leaves the cache unloaded (so the next lookup retries)
    /// and yields an empty list.
    pub async fn refresh(self: &Arc<Self>) -> Vec<VoiceDescriptor> {
        self.ensure_listener();
        self.fetch_and_replace()
            .await
            .map(|voices| voices.as_ref().clone())
            .unwrap_or_default()
    }

    /// The cached voices, loading them on first use.
    pub async fn voices(self: &Arc<Self>) -> Arc<Vec<VoiceDescriptor>> {
        self.ensure_listener();
        if let Some(cached) = self.cached() {
            return cached;
        }
        self.fetch_and_replace().await.unwrap_or_default()
    }

    /// The cached voices without touching the host. Empty before the
    /// first load.
    pub fn snapshot(&self) -> Vec<VoiceDescriptor> {
        self.cached().map(|v| v.as_ref().clone()).unwrap_or_default()
    }

    /// Whether a fetch has succeeded since creation (or since the last
    /// failed refresh).
    pub fn is_loaded(&self) -> bool {
        self.cached().is_some()
    }

    /// Best voice for `language_tag`, loading the catalog if needed.
    pub async fn best_match(self: &Arc<Self>, language_tag: &str) -> Option<VoiceDescriptor> {
        let voices = self.voices().await;
        match_voice(&voices, language_tag).cloned()
    }

    /// Whether any voice covers the primary subtag of `language_tag`.
    pub async fn has_language(self: &Arc<Self>, language_tag: &str) -> bool {
        let voices = self.voices().await;
        covers_language(&voices, language_tag)
    }

    fn cached(&self) -> Option<Arc<Vec<VoiceDescriptor>>> {
        match self.voices.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn store(&self, voices: Arc<Vec<VoiceDescriptor>>) {
        match self.voices.write() {
            Ok(mut guard) => *guard = Some(voices),
            Err(poisoned) => *poisoned.into_inner() = Some(voices),
        }
    }

    async fn fetch_and_replace(&self) -> Option<Arc<Vec<VoiceDescriptor>>> {
        let _fetching = self.fetch_lock.lock().await;

        if !self.host.is_supported() {
            let empty = Arc::new(Vec::new());
            self.store(empty.clone());
            return Some(empty);
        }

        match self.host.list_voices().await {
            Ok(voices) => {
                debug!(host = self.host.name(), count = voices.len(), "voice catalog loaded");
                let voices = Arc::new(voices);
                self.store(voices.clone());
                Some(voices)
            }
            Err(e) => {
                warn!(host = self.host.name(), error = %e, "failed to list voices");
                None
            }
        }
    }

    /// Subscribe to host change notifications, once per catalog.
    fn ensure_listener(self: &Arc<Self>) {
        if self.listening.swap(true, Ordering::AcqRel) {
            return;
        }
        let Some(mut changes) = self.host.voices_changed() else {
            return;
        };
        let catalog: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(()) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "voice change notifications coalesced");
                    }
                    Err(RecvError::Closed) => break,
                }
                let Some(catalog) = catalog.upgrade() else {
                    break;
                };
                debug!("host voices changed, refreshing catalog");
                catalog.fetch_and_replace().await;
            }
        });
    }
}

/// Pick the best voice for a language tag.
///
/// Tags compare case-insensitively with `_` and `-` treated alike. Tiers,
/// first hit wins:
///
/// 1. exact tag (`es-MX` -> `es-MX`)
/// 2. voice adds a subtag to the request (`es` -> `es-MX`)
/// 3. voice is a subtag-aligned prefix of the request (`en-GB` -> `en`)
/// 4. voice tag contains the request's primary subtag
///
/// Within a tier, catalog order decides.
pub fn match_voice<'a>(
    voices: &'a [VoiceDescriptor],
    language_tag: &str,
) -> Option<&'a VoiceDescriptor> {
    let wanted = normalize_tag(language_tag);
    if wanted.is_empty() {
        return None;
    }
    let primary = primary_subtag(&wanted);
    let extended = format!("{wanted}-");

    let exact = |tag: &str| tag == wanted;
    let narrower = |tag: &str| tag.starts_with(&extended);
    let broader = |tag: &str| !tag.is_empty() && wanted.starts_with(&format!("{tag}-"));
    let related = |tag: &str| !primary.is_empty() && tag.contains(primary.as_str());
    let tiers: [&dyn Fn(&str) -> bool; 4] = [&exact, &narrower, &broader, &related];

    let tags: Vec<String> = voices.iter().map(VoiceDescriptor::normalized_tag).collect();
    tiers.iter().find_map(|tier| {
        voices
            .iter()
            .zip(&tags)
            .find(|(_, tag)| tier(tag.as_str()))
            .map(|(voice, _)| voice)
    })
}

/// Whether any voice's tag starts with the primary subtag of `language_tag`.
pub fn covers_language(voices: &[VoiceDescriptor], language_tag: &str) -> bool {
    let primary = primary_subtag(language_tag);
    !primary.is_empty() && voices.iter().any(|v| v.normalized_tag().starts_with(&primary))
}
