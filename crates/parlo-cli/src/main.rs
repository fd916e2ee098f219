//! `parlo` -- CLI for the parlo speech playback engine.
//!
//! Provides the following subcommands:
//!
//! - `parlo speak` -- Speak a phrase (local engine, remote proxy fallback).
//! - `parlo voices` -- List the local voices, optionally for one language.
//! - `parlo preload` -- Check whether a language has a local voice.
//! - `parlo config` -- Show the resolved speech configuration.

use clap::{Parser, Subcommand};

mod commands;

/// parlo speech playback CLI.
#[derive(Parser)]
#[command(name = "parlo", about = "parlo speech playback CLI", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Speak a phrase.
    Speak(commands::speak::SpeakArgs),

    /// List local voices.
    Voices {
        /// Only show voices for this language (e.g. "es", "en-GB").
        #[arg(short, long)]
        lang: Option<String>,

        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Check whether a language has a local voice.
    Preload {
        /// Language tag (e.g. "es-MX").
        lang: String,

        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Show the resolved speech configuration.
    Config {
        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Speak(args) => commands::speak::run(args).await?,
        Commands::Voices { lang, config } => {
            let cfg = commands::load_config(&parlo_platform::NativePlatform::new(), config.as_deref())
                .await?;
            commands::voices::voices_list(&cfg, lang.as_deref()).await?;
        }
        Commands::Preload { lang, config } => {
            let cfg = commands::load_config(&parlo_platform::NativePlatform::new(), config.as_deref())
                .await?;
            commands::voices::preload(&cfg, &lang).await?;
        }
        Commands::Config { config } => {
            let platform = parlo_platform::NativePlatform::new();
            let cfg = commands::load_config(&platform, config.as_deref()).await?;
            let source = match config {
                Some(path) => Some(std::path::PathBuf::from(path)),
                None => commands::discover_config_path(&platform),
            };
            commands::config::config_show(&cfg, source.as_deref())?;
        }
    }

    Ok(())
}
