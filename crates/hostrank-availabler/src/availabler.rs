use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use hostrank_common::protocol::error::{HostrankError, Result};
use hostrank_common::{HostConfig, RegionRegistry};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::discovery::{DiscoveryConfig, DiscoveryFetcher};
use crate::registry::HostRegistry;
use crate::scheduler::{
    FetchScheduler, RescoreScheduler, DEFAULT_FETCH_INTERVAL, DEFAULT_RESCORE_INTERVAL,
};
use crate::scorer::{HealthScorer, PingConfig, PingScorer};
use crate::snapshot::AvailablerSnapshot;

/// Configuration of a [`HostAvailabler`].
#[derive(Debug, Clone)]
pub struct AvailablerConfig {
    /// Hosts published for the default path until the first scoring round.
    pub default_hosts: Vec<String>,
    /// Remote discovery; `None` disables the fetch loop.
    pub discovery: Option<DiscoveryConfig>,
    pub ping: PingConfig,
    pub fetch_interval: Duration,
    pub rescore_interval: Duration,
}

impl AvailablerConfig {
    pub fn new(default_hosts: Vec<String>) -> Self {
        Self {
            default_hosts,
            discovery: None,
            ping: PingConfig::default(),
            fetch_interval: DEFAULT_FETCH_INTERVAL,
            rescore_interval: DEFAULT_RESCORE_INTERVAL,
        }
    }

    /// Uses the default hosts registered for `region`.
    ///
    /// # Errors
    /// `UnknownRegion` if the region was never registered.
    pub fn for_region(regions: &RegionRegistry, region: &str) -> Result<Self> {
        Ok(Self::new(regions.hosts(region)?.to_vec()))
    }

    /// Enables discovery for `project_id` with default discovery settings.
    pub fn with_project_id(self, project_id: impl Into<String>) -> Self {
        self.with_discovery(DiscoveryConfig::new(project_id))
    }

    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = Some(discovery);
        self
    }

    pub fn with_ping(mut self, ping: PingConfig) -> Self {
        self.ping = ping;
        self
    }

    pub fn with_fetch_interval(mut self, interval: Duration) -> Self {
        self.fetch_interval = interval;
        self
    }

    pub fn with_rescore_interval(mut self, interval: Duration) -> Self {
        self.rescore_interval = interval;
        self
    }
}

/// Lifecycle of a [`HostAvailabler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AvailablerState {
    /// Loops are running and the config is being kept fresh.
    Running,
    /// Shutdown was requested; loops finish their current cycle.
    ShuttingDown,
    /// Every loop has exited. Terminal.
    Stopped,
}

/// Keeps a per-path ranking of hosts fresh and answers "which host now?".
///
/// Construction publishes the default hosts and starts the rescore loop, plus
/// the discovery loop when discovery is configured. Reads are lock-free loads
/// of the published config. Must be created inside a Tokio runtime.
///
/// # Example
/// ```no_run
/// # use hostrank_availabler::{AvailablerConfig, HostAvailabler};
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let availabler = HostAvailabler::new(
///     AvailablerConfig::new(vec!["10.0.0.1:80".into(), "10.0.0.2:80".into()])
///         .with_project_id("my-project"),
/// )?;
/// let host = availabler.get_host_by_path("/predict/api/v1");
/// # let _ = host;
/// availabler.shutdown();
/// # Ok(())
/// # }
/// ```
pub struct HostAvailabler<S: HealthScorer = PingScorer> {
    registry: Arc<HostRegistry<S>>,
    shutdown: CancellationToken,
    /// Child of `shutdown`; also cancelled when hosts are set explicitly.
    fetch_stop: CancellationToken,
    discovery_enabled: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl HostAvailabler<PingScorer> {
    /// Creates an availabler that ranks hosts by ping probes.
    ///
    /// # Errors
    /// `Config` if `config.default_hosts` is empty or an interval is zero.
    pub fn new(config: AvailablerConfig) -> Result<Self> {
        let scorer = PingScorer::new(config.ping.clone());
        Self::with_scorer(config, scorer)
    }
}

impl<S: HealthScorer> HostAvailabler<S> {
    /// Creates an availabler that ranks hosts with `scorer`.
    ///
    /// # Errors
    /// `Config` if `config.default_hosts` is empty or an interval is zero.
    pub fn with_scorer(config: AvailablerConfig, scorer: S) -> Result<Self> {
        if config.rescore_interval.is_zero() || config.fetch_interval.is_zero() {
            return Err(HostrankError::Config(format!(
                "intervals must be non-zero, rescore:{:?} fetch:{:?}",
                config.rescore_interval, config.fetch_interval
            )));
        }
        let initial = HostConfig::from_default_hosts(config.default_hosts)?;
        let registry = Arc::new(HostRegistry::new(initial, scorer));

        let shutdown = CancellationToken::new();
        let fetch_stop = shutdown.child_token();

        let mut tasks = vec![RescoreScheduler::new(
            Arc::clone(&registry),
            config.rescore_interval,
            shutdown.clone(),
        )
        .spawn()];

        let discovery_enabled = config.discovery.is_some();
        if let Some(discovery) = config.discovery {
            info!("host discovery enabled for project '{}'", discovery.project_id);
            tasks.push(
                FetchScheduler::new(
                    Arc::clone(&registry),
                    DiscoveryFetcher::new(discovery),
                    config.fetch_interval,
                    fetch_stop.clone(),
                )
                .spawn(),
            );
        }

        info!(
            "host availabler started with default hosts {:?}",
            registry.load().default_hosts()
        );

        Ok(Self {
            registry,
            shutdown,
            fetch_stop,
            discovery_enabled: AtomicBool::new(discovery_enabled),
            tasks: Mutex::new(tasks),
        })
    }

    /// Best host of the default path.
    pub fn get_host(&self) -> String {
        self.registry.load().best_host().to_string()
    }

    /// Best host of `path`, or of the default path when `path` has no hosts.
    pub fn get_host_by_path(&self, path: &str) -> String {
        self.registry.load().best_host_for(path).to_string()
    }

    /// Replaces the routing with `hosts` as the only, default, host list and
    /// turns discovery off for good.
    ///
    /// # Errors
    /// `Config` if `hosts` is empty; nothing changes in that case.
    pub fn set_hosts(&self, hosts: Vec<String>) -> Result<()> {
        let config = HostConfig::from_default_hosts(hosts)?;
        self.stop_discovery();
        info!("hosts set explicitly: {:?}", config.default_hosts());
        self.registry.replace(config);
        Ok(())
    }

    /// Requests every background loop to stop. Idempotent.
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            info!("host availabler shutting down");
        }
        self.shutdown.cancel();
    }

    /// Waits until every background loop has exited. Only returns after
    /// [`shutdown`](Self::shutdown) was called.
    pub async fn join(&self) {
        let tasks: Vec<_> = {
            let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            tasks.drain(..).collect()
        };
        for task in tasks {
            let _ = task.await;
        }
    }

    pub fn state(&self) -> AvailablerState {
        if !self.shutdown.is_cancelled() {
            return AvailablerState::Running;
        }
        let tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if tasks.iter().all(JoinHandle::is_finished) {
            AvailablerState::Stopped
        } else {
            AvailablerState::ShuttingDown
        }
    }

    /// Default-path hosts, best first.
    pub fn hosts(&self) -> Vec<String> {
        self.registry.load().default_hosts().to_vec()
    }

    /// The published config.
    pub fn host_config(&self) -> Arc<HostConfig> {
        self.registry.current()
    }

    pub fn is_discovery_enabled(&self) -> bool {
        self.discovery_enabled.load(Ordering::SeqCst)
    }

    pub fn registry(&self) -> &Arc<HostRegistry<S>> {
        &self.registry
    }

    pub fn snapshot(&self) -> AvailablerSnapshot {
        AvailablerSnapshot {
            state: self.state(),
            version: self.registry.version(),
            discovery_enabled: self.is_discovery_enabled(),
            host_config: self.registry.current().as_ref().clone(),
            failure_rates: self.registry.scorer().failure_rates(),
        }
    }

    fn stop_discovery(&self) {
        if self.discovery_enabled.swap(false, Ordering::SeqCst) {
            info!("host discovery stopped, explicit hosts take precedence");
        }
        self.fetch_stop.cancel();
    }
}

impl<S: HealthScorer> Drop for HostAvailabler<S> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostrank_common::{HostScore, HostrankError, RegionConfig};

    /// Scores every host equally, so ordering never changes.
    struct FlatScorer;

    impl HealthScorer for FlatScorer {
        async fn score_hosts(&self, hosts: &[String]) -> Result<Vec<HostScore>> {
            Ok(hosts.iter().map(|h| HostScore::new(h.clone(), 1.0)).collect())
        }
    }

    fn hosts(names: &[&str]) -> Vec<String> {
        names.iter().map(|h| h.to_string()).collect()
    }

    fn availabler(names: &[&str]) -> HostAvailabler<FlatScorer> {
        HostAvailabler::with_scorer(AvailablerConfig::new(hosts(names)), FlatScorer).unwrap()
    }

    #[test]
    fn test_availabler_config_default() {
        let config = AvailablerConfig::new(hosts(&["a"]));
        assert!(config.discovery.is_none());
        assert_eq!(config.fetch_interval, Duration::from_secs(10));
        assert_eq!(config.rescore_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_availabler_config_for_region() {
        let mut regions = RegionRegistry::new();
        regions
            .register("sg", RegionConfig::new(hosts(&["sg1:80", "sg2:80"])))
            .unwrap();

        let config = AvailablerConfig::for_region(&regions, "sg").unwrap();
        assert_eq!(config.default_hosts, hosts(&["sg1:80", "sg2:80"]));
        assert!(AvailablerConfig::for_region(&regions, "us").is_err());
    }

    #[tokio::test]
    async fn test_empty_default_hosts_fail_fast() {
        let result = HostAvailabler::with_scorer(AvailablerConfig::new(vec![]), FlatScorer);
        assert!(matches!(result, Err(HostrankError::Config(_))));
    }

    #[tokio::test]
    async fn test_zero_intervals_fail_fast() {
        let config = AvailablerConfig::new(hosts(&["a", "b"])).with_rescore_interval(Duration::ZERO);
        let result = HostAvailabler::with_scorer(config, FlatScorer);
        assert!(matches!(result, Err(HostrankError::Config(_))));

        let config = AvailablerConfig::new(hosts(&["a", "b"]))
            .with_project_id("p")
            .with_fetch_interval(Duration::ZERO);
        let result = HostAvailabler::with_scorer(config, FlatScorer);
        assert!(matches!(result, Err(HostrankError::Config(_))));
    }

    #[tokio::test]
    async fn test_initial_hosts_are_published() {
        let availabler = availabler(&["a", "b"]);
        assert_eq!(availabler.get_host(), "a");
        assert_eq!(availabler.hosts(), hosts(&["a", "b"]));
        assert_eq!(availabler.state(), AvailablerState::Running);
    }

    #[tokio::test]
    async fn test_unknown_path_falls_back_to_default() {
        let availabler = availabler(&["a", "b"]);
        assert_eq!(availabler.get_host_by_path("unknown"), availabler.get_host());
    }

    #[tokio::test]
    async fn test_set_hosts_empty_is_config_error() {
        let availabler = availabler(&["a"]);
        let err = availabler.set_hosts(vec![]).unwrap_err();
        assert!(matches!(err, HostrankError::Config(_)));
        assert_eq!(availabler.get_host(), "a");
    }

    #[tokio::test]
    async fn test_set_hosts_replaces_and_disables_discovery() {
        let config = AvailablerConfig::new(hosts(&["a"])).with_discovery(
                DiscoveryConfig::new("p").with_timeout(Duration::from_millis(50)),
            );
        let availabler = HostAvailabler::with_scorer(config, FlatScorer).unwrap();
        assert!(availabler.is_discovery_enabled());

        availabler.set_hosts(hosts(&["h1", "h2"])).unwrap();

        assert!(!availabler.is_discovery_enabled());
        assert_eq!(availabler.hosts(), hosts(&["h1", "h2"]));
        assert_eq!(availabler.get_host(), "h1");
        // the rescore loop keeps running
        assert_eq!(availabler.state(), AvailablerState::Running);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent_and_terminal() {
        let availabler = availabler(&["a", "b"]);
        availabler.shutdown();
        availabler.shutdown();
        assert_ne!(availabler.state(), AvailablerState::Running);

        availabler.join().await;
        assert_eq!(availabler.state(), AvailablerState::Stopped);

        availabler.shutdown();
        assert_eq!(availabler.state(), AvailablerState::Stopped);
        // reads keep working after shutdown
        assert_eq!(availabler.get_host(), "a");
    }

    #[tokio::test]
    async fn test_snapshot() {
        let availabler = availabler(&["a", "b"]);
        let snapshot = availabler.snapshot();
        assert_eq!(snapshot.state, AvailablerState::Running);
        assert!(!snapshot.discovery_enabled);
        assert_eq!(snapshot.host_config.best_host(), "a");
        assert!(snapshot.failure_rates.is_empty());
    }
}
