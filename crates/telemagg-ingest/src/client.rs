//! Upstream fetch.
//!
//! Performs a single HTTP/1.1 `GET` against the source endpoint with a
//! fixed timeout. Non-2xx responses are reported the same way as transport
//! failures so the retry policy treats them alike. No retries happen here.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HOST, USER_AGENT};
use http::{Method, Request, Uri};
use http_body_util::{BodyExt, Empty};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::debug;

use telemagg_core::ConfigError;

use crate::error::{IngestError, IngestResult};

/// A source of raw upstream payloads.
pub trait Fetch: Send + Sync {
    /// Fetch the full payload once.
    fn fetch(&self) -> impl Future<Output = IngestResult<String>> + Send;
}

/// Fetches the payload over plain HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// `host:port` to connect to.
    address: String,
    /// Value of the `Host` header.
    authority: String,
    path: String,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build a fetcher for an `http://` URL.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let uri: Uri = url
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("source_url {url:?}: {e}")))?;

        if uri.scheme_str() != Some("http") {
            return Err(ConfigError::Invalid(format!(
                "source_url {url:?}: only http:// is supported"
            )));
        }
        let authority = uri
            .authority()
            .ok_or_else(|| ConfigError::Invalid(format!("source_url {url:?}: missing host")))?;

        let address = format!("{}:{}", authority.host(), authority.port_u16().unwrap_or(80));
        let path = uri
            .path_and_query()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        Ok(Self {
            address,
            authority: authority.as_str().to_string(),
            path,
            timeout,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    async fn get(&self) -> IngestResult<String> {
        let stream = TcpStream::connect(&self.address)
            .await
            .map_err(|e| IngestError::Connect {
                address: self.address.clone(),
                reason: e.to_string(),
            })?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;

        // Drive the connection in the background; dropping the guard (on
        // completion, error, or cancellation) closes the socket.
        let address = self.address.clone();
        let _conn = AbortOnDrop(tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, %address, "upstream connection closed with error");
            }
        }));

        let req = Request::builder()
            .method(Method::GET)
            .uri(&self.path)
            .header(HOST, &self.authority)
            .header(USER_AGENT, concat!("telemagg/", env!("CARGO_PKG_VERSION")))
            .body(Empty::<Bytes>::new())
            .map_err(|e| IngestError::Transport(e.to_string()))?;

        let resp = sender.send_request(req).await?;
        let status = resp.status();
        if !status.is_success() {
            debug!(%status, address = %self.address, path = %self.path, "upstream non-2xx");
            return Err(IngestError::Status {
                status: status.as_u16(),
            });
        }

        let body = resp.into_body().collect().await?.to_bytes();
        String::from_utf8(body.to_vec()).map_err(|_| IngestError::Encoding)
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self) -> IngestResult<String> {
        match tokio::time::timeout(self.timeout, self.get()).await {
            Ok(result) => result,
            Err(_) => {
                debug!(address = %self.address, timeout = ?self.timeout, "upstream fetch timed out");
                Err(IngestError::Timeout(self.timeout))
            }
        }
    }
}

/// Aborts the wrapped task when dropped.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
