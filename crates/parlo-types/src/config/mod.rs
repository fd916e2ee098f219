//! Configuration schema types.
//!
//! All structs accept both `snake_case` and `camelCase` field names in JSON
//! via `#[serde(alias)]`. Unknown fields are ignored so older binaries keep
//! reading newer config files.
//!
//! # Module Structure
//!
//! - [`speech`] -- Local engine, remote proxy and default voice settings

pub mod speech;

pub use speech::*;

use serde::{Deserialize, Serialize};

/// Shared default function: returns `true`.
pub(crate) fn default_true() -> bool {
    true
}

/// Root configuration for parlo.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Speech playback settings.
    #[serde(default)]
    pub speech: SpeechConfig,
}
