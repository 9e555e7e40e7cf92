use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fiorelo",
    about = "YouTube video summary service",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Address to listen on (default 0.0.0.0:8080)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Transcript language to request (default pt)
    #[arg(short, long)]
    pub lang: Option<String>,

    /// LLM model for summarization
    #[arg(long)]
    pub model: Option<String>,

    /// Search API timeout in seconds
    #[arg(long)]
    pub search_timeout: Option<u64>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log at debug level when RUST_LOG is unset
    #[arg(short, long)]
    pub verbose: bool,
}
