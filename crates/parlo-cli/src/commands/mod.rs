//! Subcommand implementations and shared helpers.

pub mod config;
pub mod speak;
pub mod voices;

use std::path::{Path, PathBuf};

use parlo_platform::{NativePlatform, Platform};
use parlo_speech::SpeechEngine;
use parlo_types::ParloError;
use parlo_types::config::Config;

/// Load and validate the configuration.
///
/// `config_override` names a file that must exist. Without it the usual
/// discovery applies:
/// 1. `PARLO_CONFIG` env var
/// 2. `~/.parlo/config.json`
///
/// Returns a default `Config` if no config file is found.
pub async fn load_config<P: Platform>(
    platform: &P,
    config_override: Option<&str>,
) -> anyhow::Result<Config> {
    let raw = if let Some(path_str) = config_override {
        let path = Path::new(path_str);
        if !platform.fs().exists(path).await {
            return Err(ParloError::ConfigNotFound {
                path: path_str.to_owned(),
            }
            .into());
        }
        let contents = platform
            .fs()
            .read_to_string(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to read config: {e}"))?;
        let value: serde_json::Value = serde_json::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;
        parlo_platform::config_loader::normalize_keys(value)
    } else {
        parlo_platform::config_loader::load_config_raw(platform.fs(), platform.env())
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {e}"))?
    };

    let config: Config = serde_json::from_value(raw)?;
    config.speech.validate()?;
    Ok(config)
}

/// Discover the config file path (for display in `parlo config`).
pub fn discover_config_path<P: Platform>(platform: &P) -> Option<PathBuf> {
    let home = platform.fs().home_dir();
    parlo_platform::config_loader::discover_config_path(platform.env(), home)
}

/// Native platform honouring the configured engine and player binaries.
pub fn platform_for(config: &Config) -> NativePlatform {
    NativePlatform::for_speech(&config.speech)
}

/// Speech engine on the native platform.
pub fn engine_for(config: &Config) -> SpeechEngine {
    SpeechEngine::new(&config.speech, &platform_for(config))
}
