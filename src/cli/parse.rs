//! CLI parse: clap types for jikan-relay. No behavior; definitions only.

use crate::types::MalId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// jikan-relay CLI - paced, rate-limit aware client for the Jikan anime API
#[derive(Parser)]
#[command(name = "jikan-relay")]
#[command(about = "Paced, rate-limit aware client for the Jikan anime API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (searched for config/config.toml)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search anime by title, or by initial letter with --letter
    Search {
        /// Free-text search term
        #[arg(required_unless_present = "letter")]
        term: Option<String>,

        /// Single initial letter (A-Z) instead of a term
        #[arg(long, conflicts_with = "term")]
        letter: Option<char>,

        /// Page to fetch (1-based)
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        /// Results per page (defaults to search.default_page_size)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=25))]
        limit: Option<u32>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show full details for one anime by MyAnimeList id
    Show {
        id: MalId,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the effective configuration as TOML
    Config,
}
