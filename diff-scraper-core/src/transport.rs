//! Authenticated GET requests with a flat retry loop.
//!
//! Success is strictly HTTP 200. Any other status, and any network-level
//! failure, counts as a failed attempt. After [`RetryPolicy::attempts`] failed
//! attempts the caller receives [`ApiError::Exhausted`] and is expected to skip
//! its unit of work rather than abort the run.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::contract::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://gitlab.com/api/v4";

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// Fixed number of attempts with a fixed pause between them. No backoff, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

#[derive(Clone)]
pub struct TransportConfig {
    pub base_url: String,
    pub private_token: String,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>, private_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            private_token: private_token.into(),
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

// The token must never reach the logs.
impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("base_url", &self.base_url)
            .field("private_token", &"<redacted>")
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub struct Transport {
    client: Client,
    base_url: String,
    private_token: String,
    retry: RetryPolicy,
}

impl Transport {
    pub fn new(config: TransportConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, config))
    }

    /// Uses a caller-supplied client; the config's timeout is then ignored.
    pub fn with_client(client: Client, config: TransportConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            private_token: config.private_token,
            retry: config.retry,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Requests `path` relative to the base URL and decodes the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let body = self.request(&url, query).await?;
        serde_json::from_str(&body).map_err(|source| ApiError::Decode { url, source })
    }

    /// Issues the GET with retries and returns the raw body of the first 200 response.
    pub async fn request(&self, url: &str, query: &[(&str, String)]) -> Result<String, ApiError> {
        let attempts = self.retry.attempts.max(1);
        let mut last = String::new();

        for attempt in 1..=attempts {
            match self.attempt(url, query).await {
                Ok(body) => {
                    debug!(url, attempt, bytes = body.len(), "Request succeeded");
                    return Ok(body);
                }
                Err(reason) => {
                    warn!(url, attempt, attempts, reason = %reason, "Request attempt failed");
                    last = reason;
                    if attempt < attempts {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }

        Err(ApiError::Exhausted {
            url: url.to_string(),
            attempts,
            last,
        })
    }

    async fn attempt(&self, url: &str, query: &[(&str, String)]) -> Result<String, String> {
        let mut request = self
            .client
            .get(url)
            .header(TOKEN_HEADER, self.private_token.as_str());
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(format!("unexpected status {status}"));
        }
        response.text().await.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_without_double_slashes() {
        let transport = Transport::with_client(
            Client::new(),
            TransportConfig::new("https://gitlab.example.com/api/v4/", "token"),
        );
        assert_eq!(
            transport.url("/groups/7/subgroups/"),
            "https://gitlab.example.com/api/v4/groups/7/subgroups/"
        );
        assert_eq!(
            transport.url("projects/1"),
            "https://gitlab.example.com/api/v4/projects/1"
        );
    }

    #[test]
    fn debug_output_redacts_the_token() {
        let config = TransportConfig::new(DEFAULT_BASE_URL, "glpat-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("glpat-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn default_policy_is_three_flat_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(1));
    }
}
