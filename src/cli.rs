//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

/// Agentic - conversational computer control through a local LLM
#[derive(Debug, Parser)]
#[command(name = "agentic", about = "Conversational computer control through a local LLM", version)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Override the configured model
    #[arg(long, help = "Override the configured model")]
    pub model: Option<String>,

    /// Override the configured backend URL
    #[arg(long, help = "Override the configured backend URL")]
    pub url: Option<String>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,
}
