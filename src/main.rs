//! spotify-etl - lands a user's recently played Spotify tracks in SQLite
//!
//! Each run extracts today's plays, reshapes them into songs and albums and
//! upserts them into a staging schema before promoting them to main.

mod config;
mod db;
mod errors;
mod etl;
mod models;
mod pipeline;
mod spotify;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::config::{EtlConfig, Paths};
use crate::db::DbEngine;
use crate::etl::{transform, Extractor, Loader};
use crate::pipeline::schedule::run_scheduled;
use crate::pipeline::{payload, Pipeline};
use crate::spotify::{SpotifyClient, TokenManager};

/// spotify-etl - daily recently-played ETL
#[derive(Parser, Debug)]
#[command(name = "spotify-etl")]
#[command(version)]
#[command(about = "Pull today's Spotify plays into a staging and main SQLite store")]
struct Args {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Path to config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run extract, transform and load once, retrying a failed run
    Run,

    /// Run daily on a cron schedule until interrupted
    Schedule {
        /// Cron expression (sec min hour day month weekday); overrides settings
        #[arg(long)]
        cron: Option<String>,
    },

    /// Extract today's plays into a JSON payload
    Extract {
        #[arg(long)]
        output: PathBuf,
    },

    /// Turn extracted plays into songs and albums
    Transform {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },

    /// Load a transformed payload into staging and main
    Load {
        #[arg(long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // a missing .env is fine; real environment variables still apply
    let _ = dotenvy::dotenv();

    let log_level = if args.debug { "debug" } else { "info" };

    // keep client libraries quiet unless something goes wrong
    let filter = tracing_subscriber::EnvFilter::new(format!(
        "{},sqlx=warn,hyper=warn,reqwest=warn,tokio_cron_scheduler=warn",
        log_level
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let paths = Paths::init(args.config)?;
    info!("Config directory: {:?}", paths.config_dir());

    let config = EtlConfig::load(&paths)?;

    match args.command {
        Command::Run => {
            let pipeline = build_pipeline(&paths, config).await?;
            pipeline.run().await?;
        }
        Command::Schedule { cron } => {
            let cron = cron.unwrap_or_else(|| config.schedule.clone());
            let pipeline = build_pipeline(&paths, config).await?;
            run_scheduled(Arc::new(pipeline), &cron).await?;
        }
        Command::Extract { output } => extract_to_file(&config, &output).await?,
        Command::Transform { input, output } => transform_file(&input, &output)?,
        Command::Load { input } => load_file(&paths, &config, &input).await?,
    }

    Ok(())
}

async fn open_db(paths: &Paths, config: &EtlConfig) -> Result<DbEngine> {
    DbEngine::connect(
        &config.database_path(paths),
        &config.staging_database_path(paths),
    )
    .await
}

async fn build_pipeline(paths: &Paths, config: EtlConfig) -> Result<Pipeline> {
    config.validate()?;
    let http = spotify::http_client(&config)?;
    let db = open_db(paths, &config).await?;
    Ok(Pipeline::new(config, http, db))
}

async fn extract_to_file(config: &EtlConfig, output: &Path) -> Result<()> {
    config.validate()?;
    let http = spotify::http_client(config)?;
    let tokens = TokenManager::from_config(http.clone(), config);
    let source = SpotifyClient::new(http, config);

    let events = Extractor::new(&tokens, &source, config.recent_limit)
        .extract_recent()
        .await?;

    payload::write_json(output, &events)?;
    info!("Extracted {} tracks to {}", events.len(), output.display());
    Ok(())
}

fn transform_file(input: &Path, output: &Path) -> Result<()> {
    let events = payload::read_play_events(input)?;
    let transformed = transform(&events)?;
    payload::write_json(output, &transformed)?;
    info!(
        "Wrote {} songs and {} albums to {}",
        transformed.songs.len(),
        transformed.albums.len(),
        output.display()
    );
    Ok(())
}

async fn load_file(paths: &Paths, config: &EtlConfig, input: &Path) -> Result<()> {
    let transformed = payload::read_transformed(input)?;
    let db = open_db(paths, config).await?;

    let report = Loader::new(&db)
        .load(&transformed.songs, &transformed.albums)
        .await
        .context("Load failed")?;

    info!(
        "Load process completed successfully: main holds {} songs and {} albums",
        report.main_songs, report.main_albums
    );
    Ok(())
}
