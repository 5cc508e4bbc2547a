//! Svar CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use svar::cli::{commands, Cli, Commands};
use svar::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials such as HF_TOKEN may live in a local .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("svar={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Ensure working directories exist
    std::fs::create_dir_all(settings.cache_dir())?;
    std::fs::create_dir_all(settings.temp_audio_dir())?;

    // Execute command
    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Ask {
            question,
            urls,
            audio,
            top_k,
        } => {
            commands::run_ask(question, urls, audio.as_deref(), *top_k, settings).await?;
        }

        Commands::Chat { urls, audio, top_k } => {
            commands::run_chat(urls, audio.as_deref(), *top_k, settings).await?;
        }

        Commands::Transcript { input } => {
            commands::run_transcript(input, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, config_path)?;
        }
    }

    Ok(())
}
