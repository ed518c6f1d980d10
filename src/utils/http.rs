//! HTTP client utilities.

use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use super::retry::{with_retry, RetryConfig};
use crate::config::{HttpConfig, RetrySettings};
use crate::sources::SourceError;

/// Enforces a minimum interval between consecutive requests
#[derive(Debug, Default)]
pub struct Pacer {
    interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the interval since the previous request has elapsed
    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }

        let mut last_request = self.last_request.lock().await;
        if let Some(previous) = *last_request {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                sleep(self.interval - elapsed).await;
            }
        }
        *last_request = Some(Instant::now());
    }
}

/// Shared HTTP client with explicit timeouts, retries and per-source pacing
///
/// Clones share the underlying connection pool. [`HttpClient::paced`] gives
/// a source its own pacer on top of the shared pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    pacer: Arc<Pacer>,
    retry: RetryConfig,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, SourceError> {
        Self::from_config(&HttpConfig::default(), &RetrySettings::default())
    }

    /// Create a client from configuration
    pub fn from_config(http: &HttpConfig, retry: &RetrySettings) -> Result<Self, SourceError> {
        let user_agent = http.user_agent.clone().unwrap_or_else(|| {
            format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        });

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(http.timeout())
            .connect_timeout(http.connect_timeout())
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            pacer: Arc::new(Pacer::default()),
            retry: RetryConfig::from(retry),
        })
    }

    /// A client sharing this connection pool with its own request pacing
    pub fn paced(&self, interval: Duration) -> Self {
        Self {
            client: Arc::clone(&self.client),
            pacer: Arc::new(Pacer::new(interval)),
            retry: self.retry,
        }
    }

    pub fn pacing(&self) -> Duration {
        self.pacer.interval()
    }

    /// Send a paced GET request, retrying transient failures
    ///
    /// Any non-success status is returned as [`SourceError::Status`].
    pub async fn get(
        &self,
        service: &str,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<Response, SourceError> {
        with_retry(self.retry, || async move {
            self.pacer.wait().await;

            let mut request = self.client.get(url);
            if !query.is_empty() {
                request = request.query(query);
            }
            for (name, value) in headers {
                request = request.header(*name, *value);
            }

            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(SourceError::Status {
                    service: service.to_string(),
                    status: status.as_u16(),
                });
            }

            Ok(response)
        })
        .await
    }

    /// GET a response body as text
    pub async fn get_text(
        &self,
        service: &str,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<String, SourceError> {
        let response = self.get(service, url, query, headers).await?;
        response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read {} response: {}", service, e)))
    }

    /// GET a response body as JSON
    pub async fn get_json(
        &self,
        service: &str,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<serde_json::Value, SourceError> {
        let body = self.get_text(service, url, query, headers).await?;
        serde_json::from_str(&body)
            .map_err(|e| SourceError::Parse(format!("Failed to parse {} JSON: {}", service, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pacer_spaces_requests() {
        let pacer = Pacer::new(Duration::from_millis(40));
        let start = Instant::now();

        pacer.wait().await;
        pacer.wait().await;
        pacer.wait().await;

        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_zero_pacer_does_not_wait() {
        let pacer = Pacer::default();
        let start = Instant::now();

        pacer.wait().await;
        pacer.wait().await;

        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_paced_clients_share_pool() {
        let client = HttpClient::new().unwrap();
        let paced = client.paced(Duration::from_millis(400));

        assert!(Arc::ptr_eq(&client.client, &paced.client));
        assert_eq!(paced.pacing(), Duration::from_millis(400));
        assert_eq!(client.pacing(), Duration::ZERO);
    }
}
