//! Voice descriptors and BCP-47-ish language tag helpers.

use serde::{Deserialize, Serialize};

/// One synthesis voice exposed by the host platform.
///
/// Descriptors are immutable snapshots. The catalog replaces its whole set
/// on refresh; individual entries are never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    /// Host-specific identifier passed back when speaking (e.g. `"es-mx"`
    /// for espeak-ng, a voice URI on other hosts).
    pub identifier: String,

    /// Language tag the host reports for this voice (e.g. `"es-MX"`).
    #[serde(alias = "languageTag", alias = "lang")]
    pub language_tag: String,

    /// Whether the voice synthesizes on-device rather than via a network
    /// service owned by the host.
    #[serde(default = "default_local", alias = "isLocal", alias = "localService")]
    pub is_local: bool,
}

fn default_local() -> bool {
    true
}

impl VoiceDescriptor {
    pub fn new(identifier: impl Into<String>, language_tag: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            language_tag: language_tag.into(),
            is_local: true,
        }
    }

    /// The voice's language tag in comparison form (see [`normalize_tag`]).
    pub fn normalized_tag(&self) -> String {
        normalize_tag(&self.language_tag)
    }
}

/// Lowercase a tag and use `-` as the only subtag separator.
///
/// Android and some Linux engines report `en_US`; browsers report `en-US`.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().replace('_', "-").to_ascii_lowercase()
}

/// The leading language component of a tag (`"en"` for `"en-US"`).
///
/// Returned lowercased. An empty tag yields an empty string.
pub fn primary_subtag(tag: &str) -> String {
    let normalized = normalize_tag(tag);
    match normalized.split_once('-') {
        Some((primary, _)) => primary.to_string(),
        None => normalized,
    }
}
