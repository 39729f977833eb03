//! Remote discovery of the path → hosts mapping.

use std::time::{Duration, Instant};

use hostrank_common::protocol::error::{HostrankError, Result};
use hostrank_common::{HostConfig, HostMap, HttpTransport};
use tracing::{debug, warn};

use crate::registry::{HostRegistry, UpdateOutcome};
use crate::scorer::HealthScorer;
use crate::template;

pub const DEFAULT_DISCOVERY_URL_FORMAT: &str = "http://{}/data/api/sdk/host?project_id={}";

/// Discovery configuration. Its presence enables the fetch loop.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub project_id: String,
    /// First `{}` is the host, second the project id.
    pub url_format: String,
    pub timeout: Duration,
    /// Attempts per fetch cycle.
    pub attempts: usize,
}

impl DiscoveryConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            url_format: DEFAULT_DISCOVERY_URL_FORMAT.to_string(),
            timeout: Duration::from_secs(10),
            attempts: 3,
        }
    }

    pub fn with_url_format(mut self, url_format: impl Into<String>) -> Self {
        self.url_format = url_format.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts;
        self
    }
}

/// Result of one fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The mapping changed and went through the update pipeline.
    Applied(UpdateOutcome),
    /// The server returned the hosts already published.
    Unchanged,
    /// The payload had no usable default path.
    Rejected,
    /// Every attempt failed or came back empty.
    Exhausted,
}

pub struct DiscoveryFetcher {
    config: DiscoveryConfig,
    transport: HttpTransport,
}

impl DiscoveryFetcher {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self::with_transport(config, HttpTransport::new())
    }

    pub fn with_transport(config: DiscoveryConfig, transport: HttpTransport) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn url_for(&self, host: &str) -> String {
        template::fill(&self.config.url_format, &[host, self.config.project_id.as_str()])
    }

    /// One request. `Ok(None)` means the server answered with an empty body.
    pub async fn fetch(&self, url: &str) -> Result<Option<HostMap>> {
        let start = Instant::now();
        let reply = self.transport.get(url, self.config.timeout).await?;
        let cost = start.elapsed().as_millis();
        if !reply.is_ok() {
            warn!(
                "fetch host from server return not ok status, cost:'{}' ms, status:'{}'",
                cost, reply.status
            );
            return Err(HostrankError::HttpStatus(reply.status));
        }
        debug!("fetch host from server, cost:'{}' ms, rsp:'{}'", cost, reply.text());
        if reply.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&reply.body)?))
    }

    /// Fetches the mapping, retrying transient failures, and hands a changed
    /// mapping to the registry. Never fails: problems are logged and the next
    /// cycle tries again.
    pub async fn run_once<S: HealthScorer>(&self, registry: &HostRegistry<S>) -> FetchOutcome {
        let current = registry.current();
        let url = self.url_for(current.best_host());

        for attempt in 1..=self.config.attempts {
            let map = match self.fetch(&url).await {
                Ok(Some(map)) => map,
                Ok(None) => {
                    warn!("hosts from server are empty, url:'{}' attempt:{}", url, attempt);
                    continue;
                }
                Err(e) => {
                    warn!(
                        "fetch host from server err, url:'{}', attempt:{}, err:'{}'",
                        url, attempt, e
                    );
                    continue;
                }
            };

            let candidate = match HostConfig::new(map) {
                Ok(candidate) => candidate,
                Err(e) => {
                    warn!("hosts from server are invalid, url:'{}': {}", url, e);
                    return FetchOutcome::Rejected;
                }
            };

            if candidate.same_host_sets(&current) {
                debug!("hosts from server are not changed, config:'{:?}'", candidate.as_map());
                return FetchOutcome::Unchanged;
            }

            let outcome = registry.score_and_update(&current, &candidate).await;
            return FetchOutcome::Applied(outcome);
        }

        warn!("fetch host from server fail although retried, url:'{}'", url);
        FetchOutcome::Exhausted
    }
}
