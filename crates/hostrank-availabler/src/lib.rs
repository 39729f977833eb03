//! Adaptive host availability.
//!
//! Keeps, per request path, a list of candidate hosts ranked best first and
//! re-ranks it in the background:
//!
//! - [`RescoreScheduler`] re-scores the published hosts every second
//! - [`FetchScheduler`] polls a discovery endpoint for a new path → hosts
//!   mapping every ten seconds, when a project id is configured
//!
//! Both feed [`HostRegistry::score_and_update`], which scores hosts with a
//! [`HealthScorer`] (by default [`PingScorer`], sliding-window ping failure
//! rates), stable-sorts every path and atomically publishes the result unless
//! the order did not change. [`HostAvailabler`] ties it together and answers
//! lock-free `get_host` / `get_host_by_path` reads.

pub mod availabler;
pub mod discovery;
pub mod registry;
pub mod scheduler;
pub mod scorer;
pub mod selector;
pub mod snapshot;
mod template;
pub mod window;

pub use availabler::{AvailablerConfig, AvailablerState, HostAvailabler};
pub use discovery::{DiscoveryConfig, DiscoveryFetcher, FetchOutcome};
pub use registry::{HostRegistry, UpdateOutcome};
pub use scheduler::{FetchScheduler, RescoreScheduler};
pub use scorer::{default_ping_success, HealthScorer, PingConfig, PingPredicate, PingScorer};
pub use selector::HostSelector;
pub use snapshot::AvailablerSnapshot;
pub use window::Window;
