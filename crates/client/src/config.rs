//! Client configuration.

use std::time::Duration;

use covesync_protocol::constants::API_PREFIX;
use covesync_transfer::DEFAULT_CHUNK_SIZE;
use covesync_upload::{ClientError, RetryConfig};

/// Connection settings for one appliance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Appliance hostname, without scheme.
    pub host: String,
    /// OAuth bearer token.
    pub token: String,
    /// Payload size of upload chunks.
    pub chunk_size: usize,
    /// Per-request timeout. An elapsed timeout counts as a transport
    /// failure: the outcome is unknown and the upload reconciles.
    pub timeout: Duration,
    /// Reconciliation backoff policy.
    pub retry: RetryConfig,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ClientError> {
        if self.host.is_empty() {
            return Err(ClientError::Config("host must not be empty".into()));
        }
        if self.token.is_empty() {
            return Err(ClientError::Config("access token must not be empty".into()));
        }
        if self.chunk_size == 0 {
            return Err(ClientError::Config("chunk size must be positive".into()));
        }
        Ok(())
    }

    /// Base URL of the appliance API.
    pub(crate) fn base_url(&self) -> String {
        format!("https://{}/{API_PREFIX}", self.host.trim_end_matches('/'))
    }
}
