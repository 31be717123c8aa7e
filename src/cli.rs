//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use clap::{Parser, Subcommand};

use crate::client::DEFAULT_BASE_URL;
use crate::output::Format;

/// Philippine earthquake dashboard backed by PHIVOLCS data.
#[derive(Parser, Debug)]
#[command(name = "quakeph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Base URL of the earthquake API
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    pub api_url: String,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the live web dashboard
    Serve(ServeArgs),

    /// List recorded earthquakes
    List(ListArgs),

    /// Show the strongest earthquakes
    Top(CountArgs),

    /// Show the most recent earthquakes
    Recent(CountArgs),

    /// Show summary statistics
    Stats(StatsArgs),

    /// Search earthquakes by magnitude range and location
    Filter(FilterArgs),
}

/// Arguments for the `serve` command.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Poll interval in seconds (minimum 30)
    #[arg(long, default_value = "60")]
    pub poll_interval: u64,

    /// Earthquakes requested per poll of the full list
    #[arg(long, default_value = "50")]
    pub limit: usize,

    /// Rows in the "Top by Magnitude" list
    #[arg(long, default_value = "5")]
    pub top: usize,

    /// Rows in the "Recent Earthquakes" list
    #[arg(long, default_value = "10")]
    pub recent: usize,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

/// Arguments for the `list` command.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Maximum number of earthquakes to show
    #[arg(long, short = 'n', default_value = "50")]
    pub limit: usize,

    /// Number of earthquakes to skip
    #[arg(long)]
    pub offset: Option<usize>,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `top` and `recent` commands.
#[derive(Parser, Debug)]
pub struct CountArgs {
    /// Number of earthquakes to show
    pub count: Option<usize>,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `stats` command.
#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `filter` command.
#[derive(Parser, Debug)]
pub struct FilterArgs {
    /// Minimum magnitude (inclusive)
    #[arg(long)]
    pub min_magnitude: Option<f64>,

    /// Maximum magnitude (inclusive)
    #[arg(long)]
    pub max_magnitude: Option<f64>,

    /// Case-insensitive location substring
    #[arg(long)]
    pub location: Option<String>,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}
