//! `parlo speak` -- speak a phrase.
//!
//! Uses the local engine when it can and the remote proxy otherwise.
//! Ctrl+C stops local playback.
//!
//! # Example
//!
//! ```text
//! parlo speak --lang es-MX --rate 0.8 "¿Dónde está la biblioteca?"
//! ```

use clap::Args;
use parlo_speech::SpeakOptions;
use tracing::info;

/// Arguments for `parlo speak`.
#[derive(Debug, Args)]
pub struct SpeakArgs {
    /// Text to speak. Multiple words are joined with spaces.
    #[arg(required = true)]
    pub text: Vec<String>,

    /// Language tag (e.g. "es-MX", "fr", "en_GB").
    #[arg(short, long, default_value = "en")]
    pub lang: String,

    /// Speaking rate multiplier (0.1-10, 1.0 = normal).
    #[arg(long)]
    pub rate: Option<f32>,

    /// Pitch multiplier (0-2, 1.0 = normal).
    #[arg(long)]
    pub pitch: Option<f32>,

    /// Volume (0-1).
    #[arg(long)]
    pub volume: Option<f32>,

    /// Config file path (overrides auto-discovery).
    #[arg(short, long)]
    pub config: Option<String>,
}

impl SpeakArgs {
    fn options(&self) -> SpeakOptions {
        SpeakOptions {
            rate: self.rate,
            pitch: self.pitch,
            volume: self.volume,
        }
    }
}

pub async fn run(args: SpeakArgs) -> anyhow::Result<()> {
    let platform = parlo_platform::NativePlatform::new();
    let cfg = super::load_config(&platform, args.config.as_deref()).await?;
    let engine = super::engine_for(&cfg);

    let text = args.text.join(" ");
    tokio::select! {
        () = engine.speak(&text, &args.lang, args.options()) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
            engine.cancel();
        }
    }
    Ok(())
}
