//! Resilient invocation of remote API calls.
//!
//! Every remote call made by the engine goes through [`Invoker::invoke`],
//! which classifies failures by their [`ErrorCode`]:
//!
//! | Class | Codes | Behavior |
//! |-------|-------|----------|
//! | Retryable | throttling, service unavailable, internal server | back off and retry |
//! | Terminal | not found, access denied, validation | fail immediately |
//! | Unclassified | anything else | fail immediately |
//!
//! Backoff starts at `base_delay` and doubles after every retry up to
//! `max_backoff`. The sleep between attempts ends early when the caller's
//! [`CancellationToken`] fires.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::api::{ApiError, ApiResult, ErrorCode};
use crate::error::{Error, Result};
use crate::observer::{ReviewEvent, ReviewObserver};

/// How a failed remote call is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient; the call is repeated after a backoff.
    Retryable,
    /// Permanent; repeating the call cannot succeed.
    Terminal,
    /// Unknown retry safety; treated like terminal.
    Unclassified,
}

/// Classify a remote error.
#[must_use]
pub fn classify(error: &ApiError) -> ErrorClass {
    match error.code {
        ErrorCode::Throttling | ErrorCode::ServiceUnavailable | ErrorCode::InternalServer => {
            ErrorClass::Retryable
        }
        ErrorCode::ResourceNotFound | ErrorCode::AccessDenied | ErrorCode::Validation => {
            ErrorClass::Terminal
        }
        ErrorCode::Conflict | ErrorCode::Other(_) => ErrorClass::Unclassified,
    }
}

/// Retry limits for remote calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per call, including the first.
    pub max_retries: u32,
    /// Wait before the first retry.
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
    /// Upper bound for any single wait.
    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, base_delay: Duration, max_backoff: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_backoff,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(Error::InvalidConfig(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.max_backoff < self.base_delay {
            return Err(Error::InvalidConfig(
                "max_backoff must not be shorter than base_delay".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runs remote calls with classification-driven retry.
///
/// Holds only configuration, so one invoker can serve any number of
/// concurrent requests.
#[derive(Clone)]
pub struct Invoker {
    config: RetryConfig,
    observer: Arc<dyn ReviewObserver>,
}

impl Invoker {
    /// Create an invoker; fails if `config` is out of range.
    pub fn new(config: RetryConfig, observer: Arc<dyn ReviewObserver>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, observer })
    }

    #[must_use]
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `call` until it succeeds, fails terminally, runs out of attempts
    /// or `cancel` fires.
    pub async fn invoke<T, F, Fut>(
        &self,
        operation: &str,
        cancel: &CancellationToken,
        mut call: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let mut backoff = self.config.base_delay;
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(cancelled(operation));
            }
            attempt += 1;

            let err = match call().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let class = classify(&err);
            if class != ErrorClass::Retryable {
                self.observer.observe(&ReviewEvent::NotRetried {
                    operation: operation.to_string(),
                    attempt,
                    class,
                    error: err.to_string(),
                });
                return Err(Error::Remote {
                    operation: operation.to_string(),
                    source: err,
                });
            }

            if attempt >= self.config.max_retries {
                self.observer.observe(&ReviewEvent::RetriesExhausted {
                    operation: operation.to_string(),
                    attempts: attempt,
                    error: err.to_string(),
                });
                return Err(Error::RetriesExhausted {
                    operation: operation.to_string(),
                    attempts: attempt,
                    source: err,
                });
            }

            self.observer.observe(&ReviewEvent::RetryScheduled {
                operation: operation.to_string(),
                attempt,
                delay: backoff,
                error: err.to_string(),
            });

            tokio::select! {
                biased;

                _ = cancel.cancelled() => return Err(cancelled(operation)),
                _ = tokio::time::sleep(backoff) => {}
            }

            backoff = backoff.saturating_mul(2).min(self.config.max_backoff);
        }
    }
}

fn cancelled(operation: &str) -> Error {
    Error::Cancelled {
        operation: operation.to_string(),
    }
}
