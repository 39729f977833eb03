pub mod error;
pub mod host_config;
pub mod score;


pub use error::{HostrankError, Result};
pub use host_config::{HostConfig, HostMap, DEFAULT_PATH};
pub use score::HostScore;
