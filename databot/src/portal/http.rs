//! HTTP capability used for portal calls. Abstracted so aggregation and tag refresh
//! can be tested without a network.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::PortalError;

/// GET JSON bodies and probe resource URLs.
///
/// **Interaction**: Used by `PortalClient`. Implementations: [`ReqwestHttpClient`],
/// [`MockHttpClient`].
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET the URL and return the body. Non-2xx responses are `PortalError::Status`.
    async fn get(&self, url: &str) -> Result<String, PortalError>;

    /// HEAD the URL with the given timeout and return the status code.
    async fn head_status(&self, url: &str, timeout: Duration) -> Result<u16, PortalError>;
}

/// Reqwest-based HTTP client. Search and listing calls have no timeout.
///
/// Liveness probes use a second client that does not follow redirects: a resource answering
/// 3xx is reported with that status, as [`MockHttpClient`] does.
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    probe: reqwest::Client,
}

fn probe_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap_or_default()
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::with_client(reqwest::Client::default())
    }
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxy, user agent) for GETs.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            probe: probe_client(),
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> Result<String, PortalError> {
        tracing::debug!(url = %url, "portal GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PortalError::transport(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PortalError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response
            .text()
            .await
            .map_err(|e| PortalError::transport(url, e))
    }

    async fn head_status(&self, url: &str, timeout: Duration) -> Result<u16, PortalError> {
        let response = self
            .probe
            .head(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| PortalError::transport(url, e))?;
        Ok(response.status().as_u16())
    }
}

#[derive(Clone, Debug)]
enum MockGet {
    Body(String),
    Status(u16),
    Unreachable,
}

/// In-memory HTTP client keyed by exact URL. Unknown GETs answer 404; unknown HEADs answer 404.
///
/// Records every requested URL so tests can assert which calls were (not) made.
#[derive(Default)]
pub struct MockHttpClient {
    gets: HashMap<String, MockGet>,
    heads: HashMap<String, u16>,
    requests: Mutex<Vec<String>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer GET `url` with `body` (200).
    pub fn with_get(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.gets.insert(url.into(), MockGet::Body(body.into()));
        self
    }

    /// Answer GET `url` with an error status.
    pub fn with_get_status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.gets.insert(url.into(), MockGet::Status(status));
        self
    }

    /// Fail GET `url` at the transport level.
    pub fn with_unreachable(mut self, url: impl Into<String>) -> Self {
        self.gets.insert(url.into(), MockGet::Unreachable);
        self
    }

    /// Answer HEAD `url` with `status`.
    pub fn with_head(mut self, url: impl Into<String>, status: u16) -> Self {
        self.heads.insert(url.into(), status);
        self
    }

    /// Every URL requested so far (GET and HEAD), in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn record(&self, url: &str) {
        if let Ok(mut r) = self.requests.lock() {
            r.push(url.to_string());
        }
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str) -> Result<String, PortalError> {
        self.record(url);
        match self.gets.get(url) {
            Some(MockGet::Body(body)) => Ok(body.clone()),
            Some(MockGet::Status(status)) => Err(PortalError::Status {
                url: url.to_string(),
                status: *status,
            }),
            Some(MockGet::Unreachable) => Err(PortalError::transport(url, "connection refused")),
            None => Err(PortalError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    async fn head_status(&self, url: &str, _timeout: Duration) -> Result<u16, PortalError> {
        self.record(url);
        Ok(self.heads.get(url).copied().unwrap_or(404))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Local server: `/moved.csv` answers 301 to `/file.csv`, everything else 200.
    async fn redirecting_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = [0u8; 1024];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let response = if request.starts_with("HEAD /moved.csv ") {
                    "HTTP/1.1 301 Moved Permanently\r\nLocation: /file.csv\r\n\
                     Content-Length: 0\r\nConnection: close\r\n\r\n"
                } else {
                    "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                };
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });
        format!("http://{}", addr)
    }

    /// **Scenario**: A redirected resource reports the 3xx status instead of the target's 200.
    #[tokio::test]
    async fn reqwest_head_does_not_follow_redirects() {
        let base = redirecting_server().await;
        let http = ReqwestHttpClient::new();
        let t = Duration::from_secs(5);
        let moved = http.head_status(&format!("{}/moved.csv", base), t).await.unwrap();
        assert_eq!(moved, 301);
        let direct = http.head_status(&format!("{}/file.csv", base), t).await.unwrap();
        assert_eq!(direct, 200);
    }

    #[tokio::test]
    async fn mock_unknown_get_is_404() {
        let http = MockHttpClient::new();
        match http.get("http://nowhere/").await {
            Err(PortalError::Status { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected 404, got {:?}", other),
        }
        assert_eq!(http.requests(), vec!["http://nowhere/"]);
    }

    #[tokio::test]
    async fn mock_head_defaults_to_404_and_records() {
        let http = MockHttpClient::new().with_head("http://a/file.csv", 200);
        let t = Duration::from_millis(10);
        assert_eq!(http.head_status("http://a/file.csv", t).await.unwrap(), 200);
        assert_eq!(http.head_status("http://a/other.csv", t).await.unwrap(), 404);
        assert_eq!(http.requests().len(), 2);
    }
}
