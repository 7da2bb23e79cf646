//! HTTP client utilities.

use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::sources::SourceError;

/// Request timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared HTTP client that applies one explicit timeout to every request
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with the crate's user agent
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        Self::with_user_agent(
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            timeout,
        )
    }

    /// Create a new HTTP client with a custom user agent
    pub fn with_user_agent(user_agent: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::from_client(Arc::new(client), timeout))
    }

    /// Create from an existing reqwest Client
    pub fn from_client(client: Arc<Client>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issue a GET request, failing on transport errors and non-success statuses
    pub async fn get(&self, url: &str) -> Result<Response, SourceError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Api(format!("{} returned status: {}", url, status)));
        }

        Ok(response)
    }

    /// GET a URL and return the body as text
    pub async fn get_text(&self, url: &str) -> Result<String, SourceError> {
        self.get(url)
            .await?
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))
    }

    /// GET a URL and return the complete body
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let bytes = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))?;
        Ok(bytes.to_vec())
    }
}
