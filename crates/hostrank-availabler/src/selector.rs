//! Host selection interface consumed by the request-dispatch layer.

use hostrank_common::protocol::error::Result;

use crate::availabler::HostAvailabler;
use crate::scorer::HealthScorer;

/// Where should the next request go?
///
/// Dispatchers hold an `Arc<dyn HostSelector>` and call
/// [`get_host_by_path`](HostSelector::get_host_by_path) per request; the
/// answer is a bare `host[:port]`.
pub trait HostSelector: Send + Sync {
    /// Best host of the default path.
    fn get_host(&self) -> String;

    /// Best host for `path`, falling back to [`get_host`](HostSelector::get_host).
    fn get_host_by_path(&self, path: &str) -> String;

    /// Overrides the host list. Fails on an empty list.
    fn set_hosts(&self, hosts: Vec<String>) -> Result<()>;

    /// Stops background work. Idempotent.
    fn shutdown(&self);
}

impl<S: HealthScorer> HostSelector for HostAvailabler<S> {
    fn get_host(&self) -> String {
        HostAvailabler::get_host(self)
    }

    fn get_host_by_path(&self, path: &str) -> String {
        HostAvailabler::get_host_by_path(self, path)
    }

    fn set_hosts(&self, hosts: Vec<String>) -> Result<()> {
        HostAvailabler::set_hosts(self, hosts)
    }

    fn shutdown(&self) {
        HostAvailabler::shutdown(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availabler::AvailablerConfig;
    use hostrank_common::HostScore;
    use std::sync::Arc;

    struct FlatScorer;

    impl HealthScorer for FlatScorer {
        async fn score_hosts(&self, hosts: &[String]) -> Result<Vec<HostScore>> {
            Ok(hosts.iter().map(|h| HostScore::new(h.clone(), 1.0)).collect())
        }
    }

    #[tokio::test]
    async fn test_availabler_as_trait_object() {
        let availabler = HostAvailabler::with_scorer(
            AvailablerConfig::new(vec!["a".into(), "b".into()]),
            FlatScorer,
        )
        .unwrap();
        let selector: Arc<dyn HostSelector> = Arc::new(availabler);

        assert_eq!(selector.get_host(), "a");
        assert_eq!(selector.get_host_by_path("/anything"), "a");
        assert!(selector.set_hosts(vec![]).is_err());

        selector.set_hosts(vec!["c".into()]).unwrap();
        assert_eq!(selector.get_host(), "c");

        selector.shutdown();
        selector.shutdown();
    }
}
