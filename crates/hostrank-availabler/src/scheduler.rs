//! Periodic background loops.
//!
//! Both loops check their cancellation token before every cycle and while
//! waiting for the next tick. A cycle that already started runs to completion;
//! its network calls carry their own timeouts, so shutdown is never held up
//! for longer than one probe or fetch.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::discovery::{DiscoveryFetcher, FetchOutcome};
use crate::registry::{HostRegistry, UpdateOutcome};
use crate::scorer::HealthScorer;

pub const DEFAULT_RESCORE_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_FETCH_INTERVAL: Duration = Duration::from_secs(10);

fn ticker(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Waits for the next tick. Returns `false` once `token` is cancelled.
async fn next_tick(interval: &mut Interval, token: &CancellationToken) -> bool {
    if token.is_cancelled() {
        return false;
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = interval.tick() => !token.is_cancelled(),
    }
}

/// Re-scores the published hosts at a fixed interval, independent of
/// discovery.
pub struct RescoreScheduler<S> {
    registry: Arc<HostRegistry<S>>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl<S: HealthScorer> RescoreScheduler<S> {
    pub fn new(
        registry: Arc<HostRegistry<S>>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            interval,
            shutdown,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        let mut interval = ticker(self.interval);
        while next_tick(&mut interval, &self.shutdown).await {
            if self.registry.rescore().await == UpdateOutcome::Published {
                debug!("rescore published version {}", self.registry.version());
            }
        }
        info!("rescore loop stopped");
    }
}

/// Runs a discovery fetch cycle at a fixed interval.
pub struct FetchScheduler<S> {
    registry: Arc<HostRegistry<S>>,
    fetcher: DiscoveryFetcher,
    interval: Duration,
    stop: CancellationToken,
}

impl<S: HealthScorer> FetchScheduler<S> {
    pub fn new(
        registry: Arc<HostRegistry<S>>,
        fetcher: DiscoveryFetcher,
        interval: Duration,
        stop: CancellationToken,
    ) -> Self {
        Self {
            registry,
            fetcher,
            interval,
            stop,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        let mut interval = ticker(self.interval);
        while next_tick(&mut interval, &self.stop).await {
            let outcome = self.fetcher.run_once(&*self.registry).await;
            if outcome != FetchOutcome::Unchanged {
                debug!("discovery cycle finished: {:?}", outcome);
            }
        }
        info!("fetch loop stopped");
    }
}
