use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::config::RetryConfig;
use crate::constants::events;
use crate::error::SupplierError;

/// Capped exponential backoff: attempt n (0-based) waits `base * 2^n` plus
/// up to `max_jitter` before the next try.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_jitter: Duration::from_millis(config.max_jitter_ms),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retrying after failed attempt `attempt`, without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    fn jitter(&self) -> Duration {
        let max = self.max_jitter.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt ceiling is reached.
    pub async fn run<T, F, Fut>(&self, supplier: &str, mut op: F) -> Result<T, SupplierError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SupplierError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(SupplierError::RetriesExhausted {
                            supplier: supplier.to_string(),
                            attempts: attempt,
                            last_error: e.to_string(),
                        });
                    }
                    let delay = self.backoff(attempt - 1) + self.jitter();
                    warn!(
                        event = events::SUPPLIER_RETRY,
                        supplier,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "[FETCH] {} failed: {}",
                        supplier,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Turns a non-success response into `SupplierError::Http`.
pub async fn check_status(
    supplier: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, SupplierError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(SupplierError::Http {
        supplier: supplier.to_string(),
        status: status.as_u16(),
        body,
    })
}
