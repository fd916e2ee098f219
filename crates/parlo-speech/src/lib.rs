//! Speech playback engine for parlo.
//!
//! Speaks short phrases for a language-learning app: the host's native
//! engine first, a remote TTS proxy when the native engine cannot do it.
//!
//! - [`catalog`] -- cached host voice list and language matching
//! - [`local`] -- one utterance on the host engine, with start-check and
//!   ceiling timers
//! - [`remote`] -- fetch-and-play against the TTS proxy
//! - [`engine`] -- [`SpeechEngine`], sequencing local then remote
//!
//! # Example
//!
//! ```rust,ignore
//! use parlo_platform::NativePlatform;
//! use parlo_speech::{SpeakOptions, SpeechEngine};
//! use parlo_types::config::SpeechConfig;
//!
//! let config = SpeechConfig::default();
//! let engine = SpeechEngine::new(&config, &NativePlatform::new());
//! engine.speak("Hola", "es-MX", SpeakOptions::default().with_rate(0.8)).await;
//! ```

pub mod catalog;
pub mod engine;
pub mod error;
pub mod local;
pub mod remote;
pub mod request;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::VoiceCatalog;
pub use engine::{PlaybackState, SpeechEngine};
pub use error::{Result, SpeechError};
pub use local::{LocalDriver, LocalDriverConfig};
pub use remote::RemoteFallback;
pub use request::{PlaybackOutcome, SpeakOptions, SpeakRequest};
