//! # parlo-types
//!
//! Core type definitions for the parlo speech playback engine.
//!
//! Every other parlo crate depends on this one. It contains:
//!
//! - **[`error`]** -- [`ParloError`] and the crate [`Result`] alias
//! - **[`config`]** -- Configuration schema for local and remote speech
//! - **[`voice`]** -- [`VoiceDescriptor`] and language-tag helpers
//! - **[`secret`]** -- [`SecretString`] for the remote proxy credential

pub mod config;
pub mod error;
pub mod secret;
pub mod voice;

pub use error::{ParloError, Result};
pub use secret::SecretString;
pub use voice::VoiceDescriptor;
