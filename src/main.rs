//! QuakePH - a live dashboard of Philippine earthquakes.
//!
//! Polls the PHIVOLCS earthquake API and serves a map-centric web
//! dashboard, with one-shot terminal commands for the same queries.

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

mod cli;
mod client;
mod dashboard;
mod errors;
mod filter;
mod geo;
mod markers;
mod models;
mod notify;
mod output;
mod refresh;
mod runtime;
mod server;
mod snapshot;
mod views;

use cli::{Cli, Command};
use client::{EarthquakeSource, PhivolcsClient};
use filter::{FilterCriteria, FilterSession};
use refresh::RefreshConfig;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Serve(args) => cmd_serve(&cli.api_url, args),
        Command::List(args) => cmd_list(&cli.api_url, args),
        Command::Top(args) => cmd_top(&cli.api_url, args),
        Command::Recent(args) => cmd_recent(&cli.api_url, args),
        Command::Stats(args) => cmd_stats(&cli.api_url, args),
        Command::Filter(args) => cmd_filter(&cli.api_url, args),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    Ok(runtime.block_on(future))
}

fn connect(api_url: &str) -> Result<PhivolcsClient> {
    PhivolcsClient::with_base_url(api_url).context("failed to create API client")
}

/// Execute the `list` command - one page of the full earthquake list.
fn cmd_list(api_url: &str, args: cli::ListArgs) -> Result<()> {
    let client = connect(api_url)?;
    let response = block_on(client.list(Some(args.limit), args.offset))?
        .context("failed to fetch earthquakes")?;

    tracing::info!(
        "{} earthquakes (data as of {})",
        response.meta.count,
        response.meta.timestamp
    );
    output::write_earthquakes(&mut io::stdout().lock(), &response.data, args.format)?;
    Ok(())
}

/// Execute the `top` command - strongest earthquakes first.
fn cmd_top(api_url: &str, args: cli::CountArgs) -> Result<()> {
    let client = connect(api_url)?;
    let count = args.count.unwrap_or(RefreshConfig::default().top_count);
    let response = block_on(client.top(count))?.context("failed to fetch top earthquakes")?;

    output::write_earthquakes(&mut io::stdout().lock(), &response.data, args.format)?;
    Ok(())
}

/// Execute the `recent` command - newest earthquakes first.
fn cmd_recent(api_url: &str, args: cli::CountArgs) -> Result<()> {
    let client = connect(api_url)?;
    let count = args.count.unwrap_or(RefreshConfig::default().recent_count);
    let response = block_on(client.recent(count))?.context("failed to fetch recent earthquakes")?;

    output::write_earthquakes(&mut io::stdout().lock(), &response.data, args.format)?;
    Ok(())
}

/// Execute the `stats` command - the dashboard's summary cards.
fn cmd_stats(api_url: &str, args: cli::StatsArgs) -> Result<()> {
    let client = connect(api_url)?;
    let response = block_on(client.stats())?.context("failed to fetch statistics")?;

    output::write_stats(&mut io::stdout().lock(), &response.data, args.format)?;
    Ok(())
}

/// Execute the `filter` command - server-side search.
fn cmd_filter(api_url: &str, args: cli::FilterArgs) -> Result<()> {
    let client = connect(api_url)?;
    let criteria = FilterCriteria {
        min_magnitude: args.min_magnitude,
        max_magnitude: args.max_magnitude,
        location: args.location.filter(|l| !l.trim().is_empty()),
    };

    let mut session = FilterSession::new();
    block_on(session.submit(&client, &criteria))?.context("failed to apply filters")?;

    let matches = session.active().unwrap_or(&[]);
    output::write_earthquakes(&mut io::stdout().lock(), matches, args.format)?;
    Ok(())
}

/// Execute the `serve` command - start the web dashboard.
fn cmd_serve(api_url: &str, args: cli::ServeArgs) -> Result<()> {
    let refresh = RefreshConfig {
        earthquake_limit: args.limit,
        top_count: args.top,
        recent_count: args.recent,
        ..RefreshConfig::with_poll_secs(args.poll_interval)
    };
    let config = server::ServerConfig {
        port: args.port,
        host: args.host.clone(),
        api_url: api_url.to_string(),
        refresh,
    };

    // Print startup message
    let url = format!("http://{}:{}", args.host, args.port);
    println!("\x1b[1m🌍 QuakePH Dashboard\x1b[0m");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("  Local:   \x1b[96m{}\x1b[0m", url);
    println!("  API:     {}", api_url);
    println!("  Poll:    {}s", config.refresh.poll_interval.as_secs());
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("\x1b[2mPress Ctrl+C to stop\x1b[0m\n");

    // Open browser if requested (using xdg-open/open command)
    if args.open {
        #[cfg(target_os = "linux")]
        let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
        #[cfg(target_os = "macos")]
        let _ = std::process::Command::new("open").arg(&url).spawn();
        #[cfg(target_os = "windows")]
        let _ = std::process::Command::new("cmd").args(["/c", "start", &url]).spawn();
    }

    block_on(server::run_server(config))?
}
