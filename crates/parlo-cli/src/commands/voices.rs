//! `parlo voices` and `parlo preload` -- inspect the local voice catalog.
//!
//! # Example
//!
//! ```text
//! parlo voices --lang es
//! parlo preload es-MX
//! ```

use comfy_table::{Table, presets::UTF8_FULL};

use parlo_speech::catalog::match_voice;
use parlo_types::VoiceDescriptor;
use parlo_types::config::Config;
use parlo_types::voice::primary_subtag;

/// Print the host's voices as a table, marking the voice that `lang`
/// would resolve to.
pub async fn voices_list(config: &Config, lang: Option<&str>) -> anyhow::Result<()> {
    let engine = super::engine_for(config);
    let voices = engine.catalog().refresh().await;

    if voices.is_empty() {
        println!(
            "No local voices found. Install espeak-ng and aplay (or paplay/ffplay), \
             or set speech.local.engineBin and speech.local.playerBin."
        );
        return Ok(());
    }

    let shown = filter_voices(&voices, lang);
    if shown.is_empty() {
        if let Some(lang) = lang {
            println!("No local voice for '{lang}'; the remote proxy will be used.");
        }
        return Ok(());
    }

    let selected = lang.and_then(|l| match_voice(&voices, l));
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["IDENTIFIER", "LANGUAGE", "LOCAL", "SELECTED"]);
    for voice in shown {
        table.add_row([
            voice.identifier.as_str(),
            voice.language_tag.as_str(),
            if voice.is_local { "yes" } else { "no" },
            if selected == Some(voice) { "*" } else { "" },
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Warm the catalog and report whether `lang` can be spoken locally.
pub async fn preload(config: &Config, lang: &str) -> anyhow::Result<()> {
    let engine = super::engine_for(config);
    if engine.preload(lang).await {
        println!("{lang}: local voice available");
    } else if config.speech.remote.is_configured() {
        println!("{lang}: no local voice, remote proxy will be used");
    } else {
        println!("{lang}: no local voice and no remote proxy configured");
    }
    Ok(())
}

/// Voices whose tag shares `lang`'s primary subtag; all of them when no
/// language is given.
fn filter_voices<'a>(voices: &'a [VoiceDescriptor], lang: Option<&str>) -> Vec<&'a VoiceDescriptor> {
    match lang {
        None => voices.iter().collect(),
        Some(lang) => {
            let primary = primary_subtag(lang);
            voices
                .iter()
                .filter(|v| v.normalized_tag().starts_with(&primary))
                .collect()
        }
    }
}
