//! # hostrank CLI Entry Point
//!
//! ## Usage
//!
//! ```bash
//! # Rank two hosts, re-scoring every second
//! hostrank watch --host 10.0.0.1:8080 --host 10.0.0.2:8080
//!
//! # Same, with discovery for a project and the best host of one path
//! hostrank watch --host 10.0.0.1:8080 --project-id 1234 --path /predict/api/v2
//!
//! # Three ping rounds
//! hostrank probe 10.0.0.1:8080 10.0.0.2:8080 --rounds 3
//!
//! # One discovery fetch
//! hostrank discover --host 10.0.0.1:8080 --project-id 1234
//! ```
//!
//! ## Host Format
//!
//! Hosts are bare `host[:port]` authorities:
//! - ✅ `10.0.0.1:8080`
//! - ✅ `predict.example.com`
//! - ❌ `http://10.0.0.1:8080`
//! - ❌ `10.0.0.1:8080/predict`

use std::time::Duration;

use anyhow::{bail, Result};
use argh::FromArgs;
use hostrank_cli::commands::{self, WatchOptions};

/// Validates that `host` is a bare `host[:port]` with no scheme or path.
fn validate_host(host: &str) -> Result<()> {
    if host.is_empty() {
        bail!("Invalid host: empty");
    }
    if host.contains("://") {
        bail!("Invalid host '{}': drop the scheme, use host[:port]", host);
    }
    if host.contains('/') || host.chars().any(char::is_whitespace) {
        bail!("Invalid host '{}': expected host[:port]", host);
    }
    if let Some((name, port)) = host.rsplit_once(':') {
        // a bare IPv6 address has no port to check
        let bare_ipv6 = name.contains(':') && !name.ends_with(']');
        if !bare_ipv6 && (name.is_empty() || port.parse::<u16>().is_err()) {
            bail!("Invalid host '{}': bad port '{}'", host, port);
        }
    }
    Ok(())
}

fn validate_hosts(hosts: &[String]) -> Result<()> {
    if hosts.is_empty() {
        bail!("At least one host is required");
    }
    hosts.iter().try_for_each(|h| validate_host(h))
}

#[derive(FromArgs)]
/// hostrank - adaptive host ranking by ping health
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Watch(WatchArgs),
    Probe(ProbeArgs),
    Discover(DiscoverArgs),
}

/// Arguments for running an availabler in the foreground.
///
/// A JSON line with the best host and a full snapshot is printed every
/// rescore interval until Ctrl-C, or until `--ticks` lines were printed.
#[derive(FromArgs)]
#[argh(subcommand, name = "watch")]
/// run an availabler and print its state
struct WatchArgs {
    /// default host, repeatable; the first one is served until the first
    /// scoring round
    #[argh(option, long = "host")]
    hosts: Vec<String>,

    /// project id; enables remote discovery when set
    #[argh(option, long = "project-id")]
    project_id: Option<String>,

    /// request path whose best host is printed instead of the default path's
    #[argh(option, long = "path")]
    path: Option<String>,

    /// milliseconds between scoring rounds
    #[argh(option, long = "rescore-interval-ms", default = "1000")]
    rescore_interval_ms: u64,

    /// seconds between discovery fetches
    #[argh(option, long = "fetch-interval-secs", default = "10")]
    fetch_interval_secs: u64,

    /// stop after this many snapshots
    #[argh(option, long = "ticks")]
    ticks: Option<u64>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "probe")]
/// ping hosts and print their scores
struct ProbeArgs {
    /// hosts to probe
    #[argh(positional)]
    hosts: Vec<String>,

    /// number of ping rounds
    #[argh(option, short = 'r', long = "rounds", default = "1")]
    rounds: u64,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "discover")]
/// fetch the path to hosts mapping once
struct DiscoverArgs {
    /// host serving the discovery endpoint
    #[argh(option, long = "host")]
    host: String,

    /// project id to fetch hosts for
    #[argh(option, long = "project-id")]
    project_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // stdout carries the JSON output, logs go to stderr
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Watch(args) => {
            validate_hosts(&args.hosts)?;
            if args.rescore_interval_ms == 0 || args.fetch_interval_secs == 0 {
                bail!("Intervals must be greater than zero");
            }
            tracing::info!("Watching hosts: {:?}", args.hosts);

            commands::run_watch(WatchOptions {
                hosts: args.hosts,
                project_id: args.project_id,
                path: args.path,
                rescore_interval: Duration::from_millis(args.rescore_interval_ms),
                fetch_interval: Duration::from_secs(args.fetch_interval_secs),
                ticks: args.ticks,
            })
            .await
        }
        Commands::Probe(args) => {
            validate_hosts(&args.hosts)?;
            commands::run_probe(args.hosts, args.rounds).await
        }
        Commands::Discover(args) => {
            validate_host(&args.host)?;
            commands::run_discover(&args.host, &args.project_id).await
        }
    }
}
