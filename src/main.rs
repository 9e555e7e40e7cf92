use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use eyre::Result;
use log::{LevelFilter, info, warn};

use fiorelo::completion::GroqCompletion;
use fiorelo::config::{self, Config, Overrides, Settings};
use fiorelo::search::YouTubeSearch;
use fiorelo::server::{self, AppState};
use fiorelo::summary::Summarizer;
use fiorelo::youtube::CaptionTranscripts;

mod cli;

use cli::Cli;

fn setup_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level).parse_default_env();

    if let Some(path) = log_file {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(path)?);
        builder.target(env_logger::Target::Pipe(target));
    }

    builder.init();

    if let Some(path) = log_file {
        info!("Logging initialized: {}", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.log_file.as_deref())?;

    // Load config file (non-fatal if missing/invalid)
    let file_config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring config file {}: {e}", config::config_path().display());
        Config::default()
    });

    let cli_overrides = Overrides {
        bind: cli.bind.clone(),
        language: cli.lang.clone(),
        model: cli.model.clone(),
        search_timeout_secs: cli.search_timeout,
    };
    let settings = Settings::resolve(file_config, &config::env_overrides(), &cli_overrides)?.with_env_keys();

    if settings.youtube_api_key.is_none() {
        warn!("YT_API_KEY not set; only debug requests will succeed");
    }
    if settings.groq_api_key.is_none() {
        warn!("GROQ_API_KEY not set; only debug requests will succeed");
    }

    let client = reqwest::Client::new();

    let search = YouTubeSearch::new(settings.youtube_api_key.clone().unwrap_or_default(), settings.search_timeout)?;
    let transcripts = CaptionTranscripts::new(client.clone());
    let llm = GroqCompletion::new(client, settings.groq_api_key.clone(), settings.model.clone());

    let summarizer = Summarizer::new(
        Arc::new(search),
        Arc::new(transcripts),
        Arc::new(llm),
        settings.summarizer_options(),
    );

    info!(
        "Summaries: lang={} model={} search_timeout={:?}",
        settings.language, settings.model, settings.search_timeout
    );

    server::serve(
        settings.bind,
        AppState {
            summarizer: Arc::new(summarizer),
        },
    )
    .await
}
