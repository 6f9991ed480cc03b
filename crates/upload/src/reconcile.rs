//! Reconciliation after ambiguous failures.
//!
//! A transport failure during a chunk send leaves the write outcome unknown:
//! the bytes may or may not have been persisted. The only safe move is to
//! ask the server how much it holds and continue from that offset. This
//! module owns that query loop and its backoff policy.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::ClientError;
use crate::session::UploadSession;
use crate::transport::Transport;

/// Backoff policy for status queries, and the bound on how many times an
/// upload may reconcile without the server offset moving forward.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Total tries per reconciliation round, and the no-progress bound.
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 250,
            max_delay_ms: 15_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-based), exponentially grown,
    /// capped, with +/-25% jitter from the clock's sub-second noise.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let grown = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let capped = grown.min(self.max_delay_ms as f64);

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        let factor = 0.75 + (nanos % 1_000) as f64 / 2_000.0;

        Duration::from_millis((capped * factor) as u64)
    }
}

/// Drives the status query until it answers or the policy gives up.
pub struct Reconciler {
    config: RetryConfig,
}

impl Reconciler {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Returns the server's durable byte count for `session`.
    ///
    /// Transport failures of the query itself are retried with backoff up to
    /// `max_attempts` total tries; every other error, and cancellation, ends
    /// the loop immediately.
    pub async fn server_offset(
        &self,
        transport: &dyn Transport,
        session: &UploadSession,
        cancel: &CancellationToken,
    ) -> Result<i64, ClientError> {
        let mut attempt = 0u32;
        loop {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            match session.bytes_received(transport).await {
                Ok(received) => return Ok(received),
                Err(ClientError::Transport(reason)) => {
                    attempt += 1;
                    if attempt >= self.config.max_attempts {
                        warn!(upload = %session.upload_id, attempt, "giving up on status query");
                        return Err(ClientError::Transport(reason));
                    }
                    let delay = self.config.delay_for_attempt(attempt - 1);
                    warn!(
                        upload = %session.upload_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "status query failed, backing off"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(other) => return Err(other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockTransport, ok_with_range, status};

    #[test]
    fn default_policy() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.initial_delay_ms, 250);
        assert_eq!(config.max_delay_ms, 15_000);
        assert_eq!(config.backoff_multiplier, 2.0);
    }

    #[test]
    fn delay_grows_within_jitter_band() {
        let config = RetryConfig::default();

        let first = config.delay_for_attempt(0).as_millis() as u64;
        assert!((187..=312).contains(&first), "attempt 0: {first}ms");

        let third = config.delay_for_attempt(2).as_millis() as u64;
        assert!((750..=1250).contains(&third), "attempt 2: {third}ms");
    }

    #[test]
    fn delay_is_capped() {
        let config = RetryConfig::default();
        let late = config.delay_for_attempt(30).as_millis() as u64;
        assert!(late <= 15_000 * 5 / 4, "attempt 30: {late}ms");
        assert!(late >= 15_000 * 3 / 4, "attempt 30: {late}ms");
    }

    #[tokio::test]
    async fn offset_returned_first_try() {
        let transport = MockTransport::new();
        transport.push(ok_with_range("bytes 0-1000000"));

        let session = UploadSession::resume("f1", "u-1", Vec::new());
        let reconciler = Reconciler::new(RetryConfig::default());
        let offset = reconciler
            .server_offset(&transport, &session, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(offset, 1_000_000);
        assert_eq!(transport.recorded().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failures_retried_with_backoff() {
        let transport = MockTransport::new();
        transport.push_error(ClientError::Transport("reset".into()));
        transport.push_error(ClientError::Transport("timeout".into()));
        transport.push(ok_with_range("bytes 0-42"));

        let session = UploadSession::resume("f1", "u-1", Vec::new());
        let reconciler = Reconciler::new(RetryConfig::default());
        let offset = reconciler
            .server_offset(&transport, &session, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(offset, 42);
        assert_eq!(transport.recorded().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let transport = MockTransport::new();
        for _ in 0..3 {
            transport.push_error(ClientError::Transport("reset".into()));
        }

        let session = UploadSession::resume("f1", "u-1", Vec::new());
        let reconciler = Reconciler::new(RetryConfig {
            max_attempts: 3,
            ..RetryConfig::default()
        });
        let err = reconciler
            .server_offset(&transport, &session, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(transport.recorded().len(), 3);
    }

    #[tokio::test]
    async fn expiry_passes_through_without_retry() {
        let transport = MockTransport::new();
        transport.push(status(410));

        let session = UploadSession::resume("f1", "u-stale", Vec::new());
        let reconciler = Reconciler::new(RetryConfig::default());
        let err = reconciler
            .server_offset(&transport, &session, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::UploadExpired { status: 410 }));
        assert_eq!(transport.recorded().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_before_first_query() {
        let transport = MockTransport::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let session = UploadSession::resume("f1", "u-1", Vec::new());
        let reconciler = Reconciler::new(RetryConfig::default());
        let err = reconciler
            .server_offset(&transport, &session, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
        assert!(transport.recorded().is_empty());
    }
}
