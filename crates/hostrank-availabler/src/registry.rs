//! Published host config and the score-and-update pipeline.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
use hostrank_common::protocol::error::{HostrankError, Result};
use hostrank_common::{HostConfig, HostScore};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::scorer::HealthScorer;

/// What a scoring round did to the published config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A re-ranked config replaced the published one.
    Published,
    /// The re-ranked config equals the published one; nothing was swapped.
    Unchanged,
    /// Scoring failed or the published config moved underneath the round.
    Abandoned,
}

/// Owns the published [`HostConfig`].
///
/// Readers go through [`load`](Self::load) / [`current`](Self::current) and
/// never block. Writers build a complete new value and swap it in with one
/// atomic store. Scoring rounds are serialized so they do not interleave on the
/// scorer's per-host state.
pub struct HostRegistry<S> {
    published: ArcSwap<HostConfig>,
    scorer: S,
    version: AtomicU64,
    round: Mutex<()>,
}

impl<S: HealthScorer> HostRegistry<S> {
    pub fn new(initial: HostConfig, scorer: S) -> Self {
        Self {
            published: ArcSwap::from_pointee(initial),
            scorer,
            version: AtomicU64::new(0),
            round: Mutex::new(()),
        }
    }

    /// Borrow of the published config, for short synchronous reads.
    pub fn load(&self) -> Guard<Arc<HostConfig>> {
        self.published.load()
    }

    /// Owned handle on the published config.
    pub fn current(&self) -> Arc<HostConfig> {
        self.published.load_full()
    }

    /// Number of configs published since construction.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Publishes `config` as is, without scoring.
    pub fn replace(&self, config: HostConfig) {
        self.published.store(Arc::new(config));
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    /// Re-ranks the published config with fresh scores.
    pub async fn rescore(&self) -> UpdateOutcome {
        let base = self.current();
        self.score_and_update(&base, &base).await
    }

    /// Scores every host of `candidate`, sorts each path best first and
    /// publishes the result unless it matches what is already published.
    ///
    /// `base` is the config the caller looked at when it decided on
    /// `candidate`. If anything else is published before the round finishes,
    /// the round is abandoned instead of overwriting the newer config.
    ///
    /// Failures never clear routing: the previous config stays published.
    pub async fn score_and_update(
        &self,
        base: &Arc<HostConfig>,
        candidate: &HostConfig,
    ) -> UpdateOutcome {
        let _round = self.round.lock().await;
        if !Arc::ptr_eq(&*self.published.load(), base) {
            debug!("host config changed while waiting for the round, skipping it");
            return UpdateOutcome::Abandoned;
        }

        let hosts = candidate.distinct_hosts();
        let scores = match self.scorer.score_hosts(&hosts).await {
            Ok(scores) => scores,
            Err(e) => {
                error!("scoring hosts failed: {}", e);
                return UpdateOutcome::Abandoned;
            }
        };
        if let Err(e) = check_coverage(&hosts, &scores) {
            error!("{}, keeping current host config", e);
            return UpdateOutcome::Abandoned;
        }
        debug!("score hosts result: '{:?}'", scores);

        let ranked = candidate.sorted_by_scores(&scores);
        if ranked == **base {
            debug!("host order is not changed, '{:?}'", ranked);
            return UpdateOutcome::Unchanged;
        }

        let ranked = Arc::new(ranked);
        let previous = self.published.compare_and_swap(base, Arc::clone(&ranked));
        if !Arc::ptr_eq(&*previous, base) {
            warn!("host config replaced during scoring round, dropping round result");
            return UpdateOutcome::Abandoned;
        }
        self.version.fetch_add(1, Ordering::SeqCst);
        info!(
            "set new host config: '{:?}', old config: '{:?}'",
            ranked.as_map(),
            base.as_map()
        );
        UpdateOutcome::Published
    }
}

/// A round is only usable when every host got exactly one score.
fn check_coverage(hosts: &[String], scores: &[HostScore]) -> Result<()> {
    if scores.is_empty() {
        return Err(HostrankError::Scoring(
            "scoring hosts return an empty list".to_string(),
        ));
    }
    let scored: HashSet<&str> = scores.iter().map(|s| s.host.as_str()).collect();
    if scores.len() != hosts.len()
        || scored.len() != hosts.len()
        || hosts.iter().any(|h| !scored.contains(h.as_str()))
    {
        return Err(HostrankError::Scoring(format!(
            "expected one score per host for {} hosts, got {}",
            hosts.len(),
            scores.len()
        )));
    }
    Ok(())
}
