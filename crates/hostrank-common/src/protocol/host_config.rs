//! Published routing state: request path → hosts ranked best first.
//!
//! A [`HostConfig`] is an immutable value. Re-ranking produces a new value via
//! [`HostConfig::sorted_by_scores`]; the owner swaps the whole value in one
//! step, so readers never see a half-sorted map.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::error::{HostrankError, Result};
use super::score::HostScore;

/// Key of the fallback host list used for paths without their own ranking.
pub const DEFAULT_PATH: &str = "*";

/// Raw path → hosts mapping, as carried on the wire by the discovery endpoint.
pub type HostMap = BTreeMap<String, Vec<String>>;

/// Validated path → ranked hosts mapping.
///
/// Invariant: the [`DEFAULT_PATH`] entry exists and is non-empty. Every
/// constructor enforces it and no method mutates in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HostMap", into = "HostMap")]
pub struct HostConfig {
    paths: HostMap,
}

impl HostConfig {
    /// Validates `paths` and wraps it.
    ///
    /// # Errors
    /// `InvalidHostConfig` if the `"*"` entry is missing or empty.
    pub fn new(paths: HostMap) -> Result<Self> {
        match paths.get(DEFAULT_PATH) {
            None => Err(HostrankError::InvalidHostConfig(format!(
                "missing '{}' entry",
                DEFAULT_PATH
            ))),
            Some(hosts) if hosts.is_empty() => Err(HostrankError::InvalidHostConfig(format!(
                "'{}' entry is empty",
                DEFAULT_PATH
            ))),
            Some(_) => Ok(Self { paths }),
        }
    }

    /// Builds a config holding only the default path.
    ///
    /// # Errors
    /// `Config` if `hosts` is empty.
    pub fn from_default_hosts(hosts: Vec<String>) -> Result<Self> {
        if hosts.is_empty() {
            return Err(HostrankError::Config("host array is empty".to_string()));
        }
        let mut paths = HostMap::new();
        paths.insert(DEFAULT_PATH.to_string(), hosts);
        Ok(Self { paths })
    }

    /// Hosts registered for `path`, best first.
    pub fn hosts_for(&self, path: &str) -> Option<&[String]> {
        self.paths.get(path).map(Vec::as_slice)
    }

    /// The fallback host list, best first. Never empty.
    pub fn default_hosts(&self) -> &[String] {
        self.hosts_for(DEFAULT_PATH).unwrap_or(&[])
    }

    /// Best host of the default path.
    pub fn best_host(&self) -> &str {
        &self.default_hosts()[0]
    }

    /// Best host of `path`, falling back to [`best_host`](Self::best_host) when
    /// the path is unknown or has no hosts.
    pub fn best_host_for(&self, path: &str) -> &str {
        match self.hosts_for(path).and_then(<[String]>::first) {
            Some(host) => host.as_str(),
            None => self.best_host(),
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &HostMap {
        &self.paths
    }

    /// Number of paths, including the default one.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Every host that appears under any path, each once, in first-seen order.
    pub fn distinct_hosts(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.paths
            .values()
            .flatten()
            .filter(|host| seen.insert(*host))
            .cloned()
            .collect()
    }

    /// Returns a copy with every path's hosts stable-sorted by descending score.
    ///
    /// Hosts missing from `scores` sort after every scored host. Equal scores
    /// keep their current relative order.
    pub fn sorted_by_scores(&self, scores: &[HostScore]) -> HostConfig {
        let index: HashMap<&str, f64> = scores
            .iter()
            .map(|s| (s.host.as_str(), s.score))
            .collect();
        let score_of = |host: &String| {
            index
                .get(host.as_str())
                .copied()
                .unwrap_or(f64::NEG_INFINITY)
        };

        let paths = self
            .paths
            .iter()
            .map(|(path, hosts)| {
                let mut hosts = hosts.clone();
                hosts.sort_by(|a, b| score_of(b).total_cmp(&score_of(a)));
                (path.clone(), hosts)
            })
            .collect();

        HostConfig { paths }
    }

    /// True when both configs cover the same paths and each path holds the
    /// same hosts, ignoring order.
    pub fn same_host_sets(&self, other: &HostConfig) -> bool {
        if self.paths.len() != other.paths.len() {
            return false;
        }
        self.paths.iter().all(|(path, hosts)| {
            let Some(other_hosts) = other.paths.get(path) else {
                return false;
            };
            if hosts.len() != other_hosts.len() {
                return false;
            }
            let mine: HashSet<&String> = hosts.iter().collect();
            let theirs: HashSet<&String> = other_hosts.iter().collect();
            mine == theirs
        })
    }
}

impl TryFrom<HostMap> for HostConfig {
    type Error = HostrankError;

    fn try_from(paths: HostMap) -> Result<Self> {
        Self::new(paths)
    }
}

impl From<HostConfig> for HostMap {
    fn from(config: HostConfig) -> Self {
        config.paths
    }
}
