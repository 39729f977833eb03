//! Hostrank Common Types and Transport
//!
//! Shared vocabulary for the hostrank availability subsystem:
//!
//! - **Protocol Layer**: [`HostConfig`] (path → ranked hosts), [`HostScore`],
//!   and the [`HostrankError`] taxonomy
//! - **Transport Layer**: a small HTTP GET client with per-call timeouts, used
//!   by both the ping prober and the discovery fetcher
//! - **Regions**: named default host lists that a client can be built from
//!
//! # Example
//!
//! ```
//! use hostrank_common::{HostConfig, HostScore};
//!
//! let config = HostConfig::from_default_hosts(vec!["a:80".into(), "b:80".into()]).unwrap();
//! let ranked = config.sorted_by_scores(&[
//!     HostScore::new("a:80", 0.2),
//!     HostScore::new("b:80", 0.9),
//! ]);
//! assert_eq!(ranked.best_host(), "b:80");
//! ```

pub mod protocol;
pub mod region;
pub mod transport;

pub use protocol::*;
pub use region::{RegionConfig, RegionRegistry};
pub use transport::{HttpReply, HttpTransport};
