//! Runners behind each subcommand.

use std::time::Duration;

use anyhow::{anyhow, Result};
use hostrank_availabler::scheduler::DEFAULT_RESCORE_INTERVAL;
use hostrank_availabler::{
    AvailablerConfig, DiscoveryConfig, DiscoveryFetcher, HealthScorer, HostAvailabler, PingConfig,
    PingScorer,
};
use hostrank_common::HostConfig;
use serde_json::json;
use tokio::time::MissedTickBehavior;

/// Options of `hostrank watch`.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub hosts: Vec<String>,
    pub project_id: Option<String>,
    pub path: Option<String>,
    pub rescore_interval: Duration,
    pub fetch_interval: Duration,
    /// Stop after this many snapshots; run until Ctrl-C when `None`.
    pub ticks: Option<u64>,
}

/// Runs an availabler and prints a snapshot every rescore interval.
pub async fn run_watch(options: WatchOptions) -> Result<()> {
    let mut config = AvailablerConfig::new(options.hosts)
        .with_rescore_interval(options.rescore_interval)
        .with_fetch_interval(options.fetch_interval);
    if let Some(project_id) = options.project_id {
        config = config.with_project_id(project_id);
    }
    let availabler = HostAvailabler::new(config)?;

    let mut interval = tokio::time::interval(options.rescore_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut printed = 0u64;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping");
                break;
            }
            _ = interval.tick() => {
                let best = match &options.path {
                    Some(path) => availabler.get_host_by_path(path),
                    None => availabler.get_host(),
                };
                let line = json!({
                    "best_host": best,
                    "snapshot": availabler.snapshot(),
                });
                println!("{}", serde_json::to_string(&line)?);

                printed += 1;
                if options.ticks.is_some_and(|ticks| printed >= ticks) {
                    break;
                }
            }
        }
    }

    availabler.shutdown();
    availabler.join().await;
    Ok(())
}

/// Runs `rounds` ping rounds, one per second, and prints the scores of each.
///
/// A single host is never probed and always scores `0`.
pub async fn run_probe(hosts: Vec<String>, rounds: u64) -> Result<()> {
    let hosts = probe_targets(hosts)?;
    let scorer = PingScorer::new(PingConfig::default());
    if hosts.len() == 1 {
        tracing::warn!("Only one host given, it will not be probed");
    }

    let mut interval = tokio::time::interval(DEFAULT_RESCORE_INTERVAL);
    for round in 1..=rounds {
        interval.tick().await;
        let scores = scorer.score_hosts(&hosts).await?;
        let line = json!({ "round": round, "scores": scores });
        println!("{}", serde_json::to_string(&line)?);
    }

    let rates = scorer.failure_rates();
    println!("{}", serde_json::to_string(&json!({ "failure_rates": rates }))?);
    Ok(())
}

/// Hosts to score, each once, in first-seen order.
fn probe_targets(hosts: Vec<String>) -> Result<Vec<String>> {
    Ok(HostConfig::from_default_hosts(hosts)?.distinct_hosts())
}

/// Fetches the path → hosts mapping once from `host` and prints it.
///
/// # Errors
///
/// Fails on transport errors, non-200 replies, unparsable or empty bodies,
/// and mappings without a usable default path.
pub async fn run_discover(host: &str, project_id: &str) -> Result<()> {
    let fetcher = DiscoveryFetcher::new(DiscoveryConfig::new(project_id));
    let url = fetcher.url_for(host);
    tracing::info!("Fetching hosts from {}", url);

    let map = fetcher
        .fetch(&url)
        .await?
        .ok_or_else(|| anyhow!("Discovery at {} returned an empty body", url))?;
    let config = HostConfig::new(map)?;

    println!("{}", serde_json::to_string(&config)?);
    Ok(())
}
