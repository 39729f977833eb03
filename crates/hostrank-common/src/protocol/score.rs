use serde::{Deserialize, Serialize};
use std::fmt;

/// Availability score of one host for one scoring round. Higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostScore {
    pub host: String,
    pub score: f64,
}

impl HostScore {
    pub fn new(host: impl Into<String>, score: f64) -> Self {
        Self {
            host: host.into(),
            score,
        }
    }
}

impl fmt::Display for HostScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host={}, score={}", self.host, self.score)
    }
}
