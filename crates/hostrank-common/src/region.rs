//! Named default host lists.
//!
//! A client that is given a region instead of an explicit host list resolves
//! its default hosts here.

use std::collections::HashMap;

use crate::protocol::error::{HostrankError, Result};

/// Default hosts served for one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionConfig {
    pub hosts: Vec<String>,
}

impl RegionConfig {
    pub fn new(hosts: Vec<String>) -> Self {
        Self { hosts }
    }
}

/// Registry of regions. Each region can be registered once.
#[derive(Debug, Default)]
pub struct RegionRegistry {
    regions: HashMap<String, RegionConfig>,
}

impl RegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `region`.
    ///
    /// # Errors
    /// `DuplicateRegion` if the region is already present, `Config` if its
    /// host list is empty.
    pub fn register(&mut self, region: impl Into<String>, config: RegionConfig) -> Result<()> {
        let region = region.into();
        if config.hosts.is_empty() {
            return Err(HostrankError::Config(format!(
                "region '{}' has no hosts",
                region
            )));
        }
        if self.regions.contains_key(&region) {
            return Err(HostrankError::DuplicateRegion(region));
        }
        self.regions.insert(region, config);
        Ok(())
    }

    pub fn contains(&self, region: &str) -> bool {
        self.regions.contains_key(region)
    }

    /// Default hosts of `region`.
    pub fn hosts(&self, region: &str) -> Result<&[String]> {
        self.regions
            .get(region)
            .map(|c| c.hosts.as_slice())
            .ok_or_else(|| HostrankError::UnknownRegion(region.to_string()))
    }
}
