//! Config file discovery and raw loading.
//!
//! Lookup order:
//! 1. `PARLO_CONFIG` (explicit path, used even if missing so the caller
//!    sees the warning).
//! 2. `~/.parlo/config.json`
//! 3. Nothing found: an empty object, so every field takes its default.
//!
//! Keys are rewritten from camelCase to snake_case before the typed
//! [`parlo_types::config::Config`] sees them.

use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::env::Environment;
use crate::fs::FileSystem;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "PARLO_CONFIG";

/// Find the config file to load, or `None` when there is none.
pub fn discover_config_path(env: &dyn Environment, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(explicit) = env.get_var(CONFIG_ENV_VAR).filter(|p| !p.trim().is_empty()) {
        return Some(PathBuf::from(explicit));
    }

    let candidate = home_dir?.join(".parlo").join("config.json");
    candidate.exists().then_some(candidate)
}

/// Discover, read and parse the config file into a normalized JSON value.
pub async fn load_config_raw(
    fs: &dyn FileSystem,
    env: &dyn Environment,
) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
    let Some(path) = discover_config_path(env, fs.home_dir()) else {
        tracing::debug!("no config file, using defaults");
        return Ok(Value::Object(Map::new()));
    };

    if !fs.exists(&path).await {
        tracing::warn!(path = %path.display(), "config file not found, using defaults");
        return Ok(Value::Object(Map::new()));
    }

    tracing::debug!(path = %path.display(), "loading config");
    let contents = fs
        .read_to_string(&path)
        .await
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|e| format!("cannot parse {}: {e}", path.display()))?;

    Ok(normalize_keys(value))
}

/// Recursively rewrite object keys from camelCase to snake_case.
///
/// Keys under `headers` are left alone: they are HTTP header names, not
/// config fields.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, val)| {
                    let key = camel_to_snake(&key);
                    let val = if key == "headers" {
                        val
                    } else {
                        normalize_keys(val)
                    };
                    (key, val)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// `"maxTextChars"` -> `"max_text_chars"`, `"startCheckMs"` -> `"start_check_ms"`.
///
/// Acronym runs stay together: `"apiKeyEnv"` -> `"api_key_env"`,
/// `"TTSEndpoint"` -> `"tts_endpoint"`.
pub fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut chars = name.chars().peekable();
    let mut prev: Option<char> = None;

    while let Some(ch) = chars.next() {
        if ch.is_uppercase() {
            let after_lower = prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit());
            let ends_acronym = prev.is_some_and(char::is_uppercase)
                && chars.peek().is_some_and(|n| n.is_lowercase());
            if (after_lower || ends_acronym) && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
        prev = Some(ch);
    }

    out
}
