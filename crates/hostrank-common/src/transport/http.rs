//! HTTP GET client with per-call timeouts.

use std::borrow::Cow;
use std::time::Duration;

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::{Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::protocol::error::{HostrankError, Result};

/// Status and fully-read body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Bytes,
}

impl HttpReply {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Shared, cheaply clonable HTTP client.
///
/// Connections are pooled by hyper; every call is bounded by the timeout it
/// is given, covering connect, response head and body.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client<HttpConnector, Empty<Bytes>>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }

    /// Issues `GET url` and reads the whole body.
    ///
    /// # Errors
    /// - `Transport` for malformed URLs, connection and body errors
    /// - `Timeout` if the exchange does not finish within `timeout`
    ///
    /// A non-200 status is not an error here; callers decide what a usable
    /// reply is.
    pub async fn get(&self, url: &str, timeout: Duration) -> Result<HttpReply> {
        let uri: Uri = url
            .parse()
            .map_err(|e| HostrankError::Transport(format!("Invalid url {}: {}", url, e)))?;

        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Empty::<Bytes>::new())
            .map_err(|e| HostrankError::Transport(format!("Failed to build request: {}", e)))?;

        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| HostrankError::Transport(format!("HTTP request failed: {}", e)))?;
            let status = response.status().as_u16();
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| HostrankError::Transport(format!("Failed to read response: {}", e)))?
                .to_bytes();
            Ok::<_, HostrankError>(HttpReply { status, body })
        };

        tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| HostrankError::Timeout(timeout.as_millis() as u64))?
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}
