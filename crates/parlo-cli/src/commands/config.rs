//! `parlo config` -- show the resolved speech configuration.
//!
//! The proxy credential is never printed; only whether one resolves.

use std::path::Path;

use parlo_types::config::Config;

pub fn config_show(config: &Config, source: Option<&Path>) -> anyhow::Result<()> {
    match source {
        Some(path) => println!("# config: {}", path.display()),
        None => println!("# config: defaults (no config file found)"),
    }
    println!("# {}", remote_summary(config));
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn remote_summary(config: &Config) -> String {
    let remote = &config.speech.remote;
    if !remote.is_configured() {
        return "remote proxy: not configured".into();
    }
    let credential = if remote.resolve_api_key().is_some() {
        "credential set"
    } else {
        "no credential"
    };
    format!("remote proxy: {} ({credential})", remote.endpoint)
}
