//! In-memory host, audio and HTTP doubles for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use parlo_platform::HostError;
use parlo_platform::audio::{AudioHandle, AudioOutput};
use parlo_platform::http::{HttpClient, HttpError, HttpResponse};
use parlo_platform::speech::{
    SpeechHost, Utterance, UtteranceError, UtteranceEvent, UtteranceEvents,
};
use parlo_types::VoiceDescriptor;
use tokio::sync::{broadcast, mpsc};

/// What [`FakeHost`] does with the next utterances.
#[derive(Debug, Clone)]
pub(crate) enum Script {
    /// Started, then Ended.
    Complete,
    /// Started, then nothing until cancelled.
    StartThenHang,
    /// No events at all until cancelled.
    Silent,
    /// Started after the delay, Ended right after.
    DelayedStart(Duration),
    /// Failed with a non-interruption error.
    Fail(&'static str),
    /// Failed(Interrupted) straight away.
    Interrupt,
    /// Started, then the event stream closes.
    StartThenClose,
    /// `speak` returns an error.
    Refuse,
}

pub(crate) struct FakeHost {
    supported: bool,
    voices: Mutex<Vec<VoiceDescriptor>>,
    fail_listing: AtomicBool,
    hang_listing: AtomicBool,
    list_calls: AtomicUsize,
    subscriptions: AtomicUsize,
    changes: broadcast::Sender<()>,
    script: Mutex<Script>,
    spoken: Mutex<Vec<Utterance>>,
    cancels: AtomicUsize,
    live: Mutex<Vec<mpsc::UnboundedSender<UtteranceEvent>>>,
}

impl FakeHost {
    fn build(supported: bool, tags: &[&str]) -> Arc<Self> {
        let (changes, _) = broadcast::channel(4);
        Arc::new(Self {
            supported,
            voices: Mutex::new(descriptors(tags)),
            fail_listing: AtomicBool::new(false),
            hang_listing: AtomicBool::new(false),
            list_calls: AtomicUsize::new(0),
            subscriptions: AtomicUsize::new(0),
            changes,
            script: Mutex::new(Script::Complete),
            spoken: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
            live: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn with_voices(tags: &[&str]) -> Arc<Self> {
        Self::build(true, tags)
    }

    pub(crate) fn unsupported() -> Arc<Self> {
        Self::build(false, &[])
    }

    pub(crate) fn scripted(tags: &[&str], script: Script) -> Arc<Self> {
        let host = Self::build(true, tags);
        host.set_script(script);
        host
    }

    pub(crate) fn set_voices(&self, tags: &[&str]) {
        *self.voices.lock().unwrap() = descriptors(tags);
    }

    pub(crate) fn set_script(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    pub(crate) fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Make `list_voices` never return.
    pub(crate) fn hang_listing(&self, hang: bool) {
        self.hang_listing.store(hang, Ordering::SeqCst);
    }

    pub(crate) fn notify_voices_changed(&self) {
        let _ = self.changes.send(());
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    pub(crate) fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub(crate) fn spoken(&self) -> Vec<Utterance> {
        self.spoken.lock().unwrap().clone()
    }
}

fn descriptors(tags: &[&str]) -> Vec<VoiceDescriptor> {
    tags.iter()
        .map(|t| VoiceDescriptor::new(format!("voice-{t}"), *t))
        .collect()
}

#[async_trait]
impl SpeechHost for FakeHost {
    fn name(&self) -> &str {
        "fake"
    }

    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, HostError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_listing.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(HostError::Engine("voice service down".into()));
        }
        Ok(self.voices.lock().unwrap().clone())
    }

    fn voices_changed(&self) -> Option<broadcast::Receiver<()>> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        Some(self.changes.subscribe())
    }

    fn speak(&self, utterance: Utterance) -> Result<UtteranceEvents, HostError> {
        self.spoken.lock().unwrap().push(utterance);
        let script = self.script.lock().unwrap().clone();
        let (tx, rx) = mpsc::unbounded_channel();

        match script {
            Script::Refuse => return Err(HostError::Engine("audio-busy".into())),
            Script::Complete => {
                let _ = tx.send(UtteranceEvent::Started);
                let _ = tx.send(UtteranceEvent::Ended);
            }
            Script::StartThenHang => {
                let _ = tx.send(UtteranceEvent::Started);
                self.live.lock().unwrap().push(tx);
            }
            Script::Silent => self.live.lock().unwrap().push(tx),
            Script::DelayedStart(delay) => {
                self.live.lock().unwrap().push(tx.clone());
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(UtteranceEvent::Started);
                    let _ = tx.send(UtteranceEvent::Ended);
                });
            }
            Script::Fail(reason) => {
                let _ = tx.send(UtteranceEvent::Failed(UtteranceError::Other(reason.into())));
            }
            Script::Interrupt => {
                let _ = tx.send(UtteranceEvent::Failed(UtteranceError::Interrupted));
            }
            Script::StartThenClose => {
                let _ = tx.send(UtteranceEvent::Started);
            }
        }
        Ok(rx)
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        for tx in self.live.lock().unwrap().drain(..) {
            let _ = tx.send(UtteranceEvent::Failed(UtteranceError::Interrupted));
        }
    }
}

/// Audio output that records every call.
#[derive(Default)]
pub(crate) struct FakeAudio {
    hang: AtomicBool,
    loads: Mutex<Vec<(Vec<u8>, String)>>,
    plays: AtomicUsize,
    releases: Mutex<HashMap<AudioHandle, usize>>,
}

impl FakeAudio {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// `play` never finishes.
    pub(crate) fn hanging() -> Arc<Self> {
        let audio = Self::default();
        audio.hang.store(true, Ordering::SeqCst);
        Arc::new(audio)
    }

    pub(crate) fn loads(&self) -> Vec<(Vec<u8>, String)> {
        self.loads.lock().unwrap().clone()
    }

    pub(crate) fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    /// Release count per handle, in no particular order.
    pub(crate) fn release_counts(&self) -> Vec<usize> {
        self.releases.lock().unwrap().values().copied().collect()
    }
}

#[async_trait]
impl AudioOutput for FakeAudio {
    async fn load(&self, audio: &[u8], mime_type: &str) -> Result<AudioHandle, HostError> {
        self.loads
            .lock()
            .unwrap()
            .push((audio.to_vec(), mime_type.to_string()));
        Ok(AudioHandle::next())
    }

    async fn play(&self, _handle: &AudioHandle) -> Result<(), HostError> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    fn release(&self, handle: &AudioHandle) {
        *self.releases.lock().unwrap().entry(*handle).or_insert(0) += 1;
    }
}

/// A request seen by [`FakeHttp`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: serde_json::Value,
}

/// HTTP client returning one canned response.
pub(crate) struct FakeHttp {
    status: u16,
    content_type: Option<&'static str>,
    body: Vec<u8>,
    delay: Option<Duration>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeHttp {
    pub(crate) fn responding(status: u16, content_type: Option<&'static str>, body: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            status,
            content_type,
            body: body.to_vec(),
            delay: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn audio() -> Arc<Self> {
        Self::responding(200, Some("audio/mpeg"), b"ID3\x04fake-mp3")
    }

    pub(crate) fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            status: 200,
            content_type: Some("audio/mpeg"),
            body: b"ID3".to_vec(),
            delay: Some(delay),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for FakeHttp {
    async fn post(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: Vec<u8>,
    ) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            headers: headers.clone(),
            body: serde_json::from_slice(&body)?,
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut headers = HashMap::new();
        if let Some(ct) = self.content_type {
            headers.insert("content-type".to_string(), ct.to_string());
        }
        Ok(HttpResponse {
            status: self.status,
            headers,
            body: self.body.clone(),
        })
    }
}
