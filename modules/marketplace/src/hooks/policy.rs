use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::contract::error::MarketError;

/// Bounds every hook call with a timeout and retries reads on transient
/// failures. Mutations run exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub timeout: Duration,
    /// Total attempts for reads, including the first.
    pub read_attempts: u32,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            read_attempts: 2,
        }
    }
}

impl CallPolicy {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_read_attempts(mut self, attempts: u32) -> Self {
        self.read_attempts = attempts.max(1);
        self
    }

    pub async fn read<T, F, Fut>(&self, mut call: F) -> Result<T, MarketError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MarketError>>,
    {
        let attempts = self.read_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.bounded(call()).await {
                Err(e) if e.is_retryable() && attempt < attempts => {
                    debug!(attempt, error = %e, "Retrying read");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    pub async fn mutate<T, Fut>(&self, call: Fut) -> Result<T, MarketError>
    where
        Fut: Future<Output = Result<T, MarketError>>,
    {
        self.bounded(call).await
    }

    async fn bounded<T, Fut>(&self, call: Fut) -> Result<T, MarketError>
    where
        Fut: Future<Output = Result<T, MarketError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(MarketError::unavailable(format!(
                "request timed out after {:?}",
                self.timeout
            ))),
        }
    }
}

/// Data, loading flag and last error of one hook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchState<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<MarketError>,
}
