//! Hostrank Transport Layer
//!
//! Outbound HTTP used by the availability subsystem. Both callers only ever
//! issue small `GET`s with a hard deadline:
//!
//! - the ping prober (`/predict/api/ping`, ~300 ms)
//! - the discovery fetcher (`/data/api/sdk/host`, ~10 s)
//!
//! # Example
//!
//! ```no_run
//! use hostrank_common::transport::HttpTransport;
//! use std::time::Duration;
//!
//! # async fn run() -> hostrank_common::Result<()> {
//! let transport = HttpTransport::new();
//! let reply = transport
//!     .get("http://127.0.0.1:8080/predict/api/ping", Duration::from_millis(300))
//!     .await?;
//! println!("{} {}", reply.status, reply.text());
//! # Ok(())
//! # }
//! ```

pub mod http;

pub use http::{HttpReply, HttpTransport};
