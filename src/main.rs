//! # Exam News Digest
//!
//! Fetches the last day's news from NewsAPI, keeps what is useful for
//! banking, civil-services and staff-selection exam preparation, and writes
//! the result to a text file that an external job publishes.
//!
//! ## Usage
//!
//! ```sh
//! NEWSAPI_KEY=... GEMINI_API_KEY=... exam_news_digest -o daily.txt
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: one date-bounded search request, first N results
//! 2. **Filtering**: keyword match, per-article model call, or raw
//! 3. **Output**: header plus numbered items, overwriting the previous run
//!
//! A missing required secret ends the run with exit code 1 before any
//! request is made. Everything after that is fail-soft.

use std::error::Error;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use chrono::Utc;
use clap::Parser;
use tracing::{error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod filters;
mod models;
mod news;
mod outputs;
mod pipeline;
mod utils;

use api::{GeminiClient, RetryAsk};
use cli::Cli;
use config::{FileConfig, ModelSettings, Settings, Strategy};
use news::NewsApiClient;
use outputs::{json, text};
use pipeline::Generator;

const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Build the model client, auto-detecting the model when asked to.
///
/// Setup problems do not abort the run; they are reported through
/// [`Generator::Unavailable`] and the pipeline saves raw titles instead.
#[instrument(level = "info", skip_all, fields(model = %settings.model))]
async fn build_generator(settings: &ModelSettings) -> Generator<RetryAsk<GeminiClient>> {
    let client = match GeminiClient::new(settings) {
        Ok(client) => client,
        Err(e) => return Generator::Unavailable(e.to_string()),
    };

    let client = if settings.auto_detect {
        match client.detect_model().await {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Model auto-detection failed");
                return Generator::Unavailable(e.to_string());
            }
        }
    } else {
        client
    };

    info!(model = %client.model(), max_retries = settings.max_retries, "Model ready");
    Generator::Ready(RetryAsk::new(client, settings.max_retries, RETRY_BASE_DELAY))
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("exam_news_digest starting up");

    let args = Cli::parse();

    let file_config = match args.config.as_deref() {
        Some(path) => FileConfig::load(path),
        None => Ok(FileConfig::default()),
    };

    // Secrets are validated here, before any request goes out.
    let settings = match file_config.and_then(|file| Settings::resolve(&args, file)) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, missing_secret = e.is_missing_secret(), "Cannot start");
            return Ok(ExitCode::FAILURE);
        }
    };
    info!(
        strategy = ?settings.strategy,
        query = %settings.news.query,
        max_articles = settings.news.max_articles,
        filter_limit = ?settings.filter_limit,
        output = %settings.output.display(),
        "Configuration resolved"
    );

    let source = NewsApiClient::new(settings.news.clone())?;
    let generator = match (&settings.strategy, &settings.model) {
        (Strategy::Generative, Some(model)) => Some(build_generator(model).await),
        _ => None,
    };

    let digest = pipeline::run(&settings, &source, generator.as_ref(), Utc::now()).await;

    text::write_digest(&digest, &settings.zone_label, &settings.output).await?;

    if let Some(path) = &settings.json_output {
        if let Err(e) = json::write_digest(&digest, path).await {
            error!(path = %path.display(), error = %e, "Failed to write JSON digest");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        strategy = ?digest.strategy,
        "Execution complete"
    );

    Ok(ExitCode::SUCCESS)
}
