//! Mock host serving both the ping and the discovery endpoint.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

#[derive(Default)]
struct Shared {
    ping: Mutex<(u16, String)>,
    discovery: Mutex<(u16, String)>,
    last_query: Mutex<Option<String>>,
    ping_hits: AtomicUsize,
    discovery_hits: AtomicUsize,
}

/// A host on `127.0.0.1:<random port>` with scripted replies.
pub struct MockHost {
    pub addr: String,
    shared: Arc<Shared>,
    _handle: tokio::task::JoinHandle<()>,
}

impl MockHost {
    /// Starts a host that answers pings with `200 pong` and discovery with
    /// `404`.
    pub async fn start() -> Self {
        let shared = Arc::new(Shared::default());
        *shared.ping.lock().unwrap() = (200, "pong".to_string());
        *shared.discovery.lock().unwrap() = (404, String::new());

        let app = Router::new()
            .route("/predict/api/ping", get(ping))
            .route("/data/api/sdk/host", get(discovery))
            .with_state(shared.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            shared,
            _handle: handle,
        }
    }

    pub fn set_ping(&self, status: u16, body: &str) {
        *self.shared.ping.lock().unwrap() = (status, body.to_string());
    }

    pub fn set_discovery(&self, status: u16, body: &str) {
        *self.shared.discovery.lock().unwrap() = (status, body.to_string());
    }

    pub fn ping_hits(&self) -> usize {
        self.shared.ping_hits.load(Ordering::SeqCst)
    }

    pub fn discovery_hits(&self) -> usize {
        self.shared.discovery_hits.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<String> {
        self.shared.last_query.lock().unwrap().clone()
    }
}

async fn ping(State(shared): State<Arc<Shared>>) -> (StatusCode, String) {
    shared.ping_hits.fetch_add(1, Ordering::SeqCst);
    let (status, body) = shared.ping.lock().unwrap().clone();
    (StatusCode::from_u16(status).unwrap(), body)
}

async fn discovery(
    State(shared): State<Arc<Shared>>,
    RawQuery(query): RawQuery,
) -> (StatusCode, String) {
    shared.discovery_hits.fetch_add(1, Ordering::SeqCst);
    *shared.last_query.lock().unwrap() = query;
    let (status, body) = shared.discovery.lock().unwrap().clone();
    (StatusCode::from_u16(status).unwrap(), body)
}

/// An address nothing listens on.
pub fn closed_addr() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().to_string()
}

pub fn hosts(names: &[&str]) -> Vec<String> {
    names.iter().map(|h| h.to_string()).collect()
}

/// Polls `condition` every 10ms for up to `secs` seconds.
pub async fn eventually(secs: u64, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(secs);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    condition()
}
