//! Host health scoring.
//!
//! [`HealthScorer`] turns a set of hosts into one [`HostScore`] per host. The
//! registry's update pipeline only depends on this trait, so scorers other than
//! [`PingScorer`] plug in without touching it.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use hostrank_common::protocol::error::Result;
use hostrank_common::{HostScore, HttpTransport};
use tracing::{debug, warn};

use crate::template;
use crate::window::{Window, DEFAULT_WINDOW_SIZE};

/// Converts hosts into availability scores, higher is better.
pub trait HealthScorer: Send + Sync + 'static {
    /// Scores `hosts` (distinct). Implementations must return exactly one
    /// score per host; anything else makes the caller drop the round.
    fn score_hosts(&self, hosts: &[String]) -> impl Future<Output = Result<Vec<HostScore>>> + Send;

    /// Current failure rate per host, for introspection.
    fn failure_rates(&self) -> BTreeMap<String, f64> {
        BTreeMap::new()
    }
}

/// Decides whether a ping reply counts as healthy, given status and body.
pub type PingPredicate = fn(status: u16, body: &[u8]) -> bool;

pub const DEFAULT_PING_URL_FORMAT: &str = "http://{}/predict/api/ping";
pub const DEFAULT_FAILURE_RATE_THRESHOLD: f64 = 0.1;
const PING_MAX_BODY_LEN: usize = 20;
const PING_TOKEN: &str = "pong";

/// Healthy when the status is 200 and the body is a short reply carrying
/// `"pong"`.
pub fn default_ping_success(status: u16, body: &[u8]) -> bool {
    if status != 200 || body.is_empty() || body.len() >= PING_MAX_BODY_LEN {
        return false;
    }
    String::from_utf8_lossy(body).contains(PING_TOKEN)
}

/// Ping scorer configuration.
#[derive(Debug, Clone)]
pub struct PingConfig {
    /// Probe URL, `{}` is replaced by the host.
    pub url_format: String,
    pub timeout: Duration,
    pub window_size: usize,
    /// Hosts whose failure rate exceeds this are logged as degraded.
    pub failure_rate_threshold: f64,
    pub success_predicate: PingPredicate,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            url_format: DEFAULT_PING_URL_FORMAT.to_string(),
            timeout: Duration::from_millis(300),
            window_size: DEFAULT_WINDOW_SIZE,
            failure_rate_threshold: DEFAULT_FAILURE_RATE_THRESHOLD,
            success_predicate: default_ping_success,
        }
    }
}

impl PingConfig {
    pub fn with_url_format(mut self, url_format: impl Into<String>) -> Self {
        self.url_format = url_format.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_failure_rate_threshold(mut self, threshold: f64) -> Self {
        self.failure_rate_threshold = threshold;
        self
    }

    pub fn with_success_predicate(mut self, predicate: PingPredicate) -> Self {
        self.success_predicate = predicate;
        self
    }

    pub fn ping_url(&self, host: &str) -> String {
        template::fill(&self.url_format, &[host])
    }
}

/// Scores hosts by `1 - failure_rate` over a sliding window of ping outcomes.
///
/// Probes of one round run concurrently; their outcomes are then folded into
/// the windows under a single lock, so concurrent rounds never lose updates to
/// a host's failure count.
pub struct PingScorer {
    config: PingConfig,
    transport: HttpTransport,
    windows: Mutex<HashMap<String, Window>>,
}

impl PingScorer {
    pub fn new(config: PingConfig) -> Self {
        Self::with_transport(config, HttpTransport::new())
    }

    pub fn with_transport(config: PingConfig, transport: HttpTransport) -> Self {
        Self {
            config,
            transport,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &PingConfig {
        &self.config
    }

    /// Probes `host` once. Every failure mode yields `false`.
    pub async fn ping(&self, host: &str) -> bool {
        let url = self.config.ping_url(host);
        let start = Instant::now();
        match self.transport.get(&url, self.config.timeout).await {
            Ok(reply) => {
                let cost = start.elapsed().as_millis();
                if (self.config.success_predicate)(reply.status, &reply.body) {
                    debug!("ping success, host:'{}' cost:'{}' ms", host, cost);
                    true
                } else {
                    warn!(
                        "ping fail, host:'{}', cost:'{}' ms, status:'{}'",
                        host, cost, reply.status
                    );
                    false
                }
            }
            Err(e) => {
                let cost = start.elapsed().as_millis();
                warn!("ping find err, host:'{}', cost:'{}' ms, err:'{}'", host, cost, e);
                false
            }
        }
    }

    /// Folds one round of outcomes into the windows and scores each host.
    fn record(&self, outcomes: Vec<(String, bool)>) -> Vec<HostScore> {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        outcomes
            .into_iter()
            .map(|(host, success)| {
                let window = windows
                    .entry(host.clone())
                    .or_insert_with(|| Window::new(self.config.window_size));
                window.put(success);
                let failure_rate = window.failure_rate();
                if failure_rate > self.config.failure_rate_threshold {
                    warn!(
                        "host degraded, host:'{}' failure rate:'{:.3}'",
                        host, failure_rate
                    );
                }
                HostScore::new(host, 1.0 - failure_rate)
            })
            .collect()
    }
}

impl HealthScorer for PingScorer {
    async fn score_hosts(&self, hosts: &[String]) -> Result<Vec<HostScore>> {
        debug!("do score hosts:'{:?}'", hosts);
        // nothing to discriminate between, skip the probe
        if let [only] = hosts {
            return Ok(vec![HostScore::new(only.clone(), 0.0)]);
        }

        let probes = hosts.iter().map(|host| async move {
            let success = self.ping(host).await;
            (host.clone(), success)
        });
        let outcomes = futures::future::join_all(probes).await;

        Ok(self.record(outcomes))
    }

    fn failure_rates(&self) -> BTreeMap<String, f64> {
        let windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        windows
            .iter()
            .map(|(host, window)| (host.clone(), window.failure_rate()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `n` distinct addresses nothing listens on.
    fn closed_addrs(n: usize) -> Vec<String> {
        let listeners: Vec<_> = (0..n)
            .map(|_| std::net::TcpListener::bind("127.0.0.1:0").unwrap())
            .collect();
        listeners
            .iter()
            .map(|l| l.local_addr().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_ping_config_default() {
        let config = PingConfig::default();
        assert_eq!(config.url_format, "http://{}/predict/api/ping");
        assert_eq!(config.timeout, Duration::from_millis(300));
        assert_eq!(config.window_size, 60);
        assert_eq!(config.failure_rate_threshold, 0.1);
    }

    #[test]
    fn test_ping_url() {
        let config = PingConfig::default().with_url_format("https://{}/health");
        assert_eq!(config.ping_url("h:443"), "https://h:443/health");
    }

    #[test]
    fn test_default_ping_success() {
        assert!(default_ping_success(200, b"pong"));
        assert!(default_ping_success(200, b"\"pong\"\n"));
        assert!(!default_ping_success(503, b"pong"));
        assert!(!default_ping_success(200, b""));
        assert!(!default_ping_success(200, b"ok"));
        assert!(!default_ping_success(200, b"pong pong pong pong pong"));
    }

    #[tokio::test]
    async fn test_single_host_short_circuits() {
        // the host is unreachable, a probe would record a failure
        let scorer = PingScorer::new(PingConfig::default());
        let scores = scorer.score_hosts(&closed_addrs(1)).await.unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].score, 0.0);
        assert!(scorer.failure_rates().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_hosts_score_as_failures() {
        let config = PingConfig::default()
            .with_window_size(4)
            .with_timeout(Duration::from_millis(200));
        let scorer = PingScorer::new(config);
        let targets = closed_addrs(2);

        let scores = scorer.score_hosts(&targets).await.unwrap();

        assert_eq!(scores.len(), 2);
        for score in &scores {
            assert_eq!(score.score, 0.75);
        }
        let rates = scorer.failure_rates();
        assert_eq!(rates.len(), 2);
        assert!(rates.values().all(|r| *r == 0.25));
    }

    #[tokio::test]
    async fn test_empty_host_set_yields_no_scores() {
        let scorer = PingScorer::new(PingConfig::default());
        assert!(scorer.score_hosts(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn test_record_creates_windows_lazily() {
        let scorer = PingScorer::new(PingConfig::default().with_window_size(2));
        let scores = scorer.record(vec![("a".to_string(), true), ("b".to_string(), false)]);
        assert_eq!(scores[0], HostScore::new("a", 1.0));
        assert_eq!(scores[1], HostScore::new("b", 0.5));

        let scores = scorer.record(vec![("b".to_string(), false)]);
        assert_eq!(scores[0], HostScore::new("b", 0.0));
        assert_eq!(scorer.failure_rates().len(), 2);
    }
}
