use std::collections::BTreeMap;

use hostrank_common::HostConfig;
use serde::Serialize;

use crate::availabler::AvailablerState;

/// Point-in-time view of an availabler, for logs and tooling.
#[derive(Debug, Clone, Serialize)]
pub struct AvailablerSnapshot {
    pub state: AvailablerState,
    /// Configs published since start.
    pub version: u64,
    pub discovery_enabled: bool,
    pub host_config: HostConfig,
    /// Window failure rate per probed host.
    pub failure_rates: BTreeMap<String, f64>,
}
