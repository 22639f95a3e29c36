//! Review event reporting.
//!
//! The engine reports retries, give-ups and degraded results through a
//! [`ReviewObserver`] it is constructed with. [`TracingObserver`] forwards
//! them to `tracing`; [`RecordingObserver`] keeps them for inspection.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::retry::ErrorClass;
use crate::types::Category;

/// Something the engine did that callers may want to see.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewEvent {
    /// A retryable failure; the call will be repeated after `delay`.
    RetryScheduled {
        operation: String,
        attempt: u32,
        delay: Duration,
        error: String,
    },
    /// The last allowed attempt failed with a retryable error.
    RetriesExhausted {
        operation: String,
        attempts: u32,
        error: String,
    },
    /// A failure that is not retried.
    NotRetried {
        operation: String,
        attempt: u32,
        class: ErrorClass,
        error: String,
    },
    /// A category was left out of a best-effort risk listing.
    CategorySkipped { category: Category, error: String },
    /// The AI evaluator failed and a placeholder answer was used.
    EvaluatorFailed { question_id: String, error: String },
}

/// Sink for [`ReviewEvent`]s.
pub trait ReviewObserver: Send + Sync {
    fn observe(&self, event: &ReviewEvent);
}

/// Observer that writes events to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ReviewObserver for TracingObserver {
    fn observe(&self, event: &ReviewEvent) {
        match event {
            ReviewEvent::RetryScheduled {
                operation,
                attempt,
                delay,
                error,
            } => {
                info!(
                    operation = %operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Retrying remote call"
                );
            }
            ReviewEvent::RetriesExhausted {
                operation,
                attempts,
                error,
            } => {
                warn!(operation = %operation, attempts, error = %error, "Retries exhausted");
            }
            ReviewEvent::NotRetried {
                operation,
                attempt,
                class,
                error,
            } => {
                debug!(
                    operation = %operation,
                    attempt,
                    class = ?class,
                    error = %error,
                    "Remote call failed without retry"
                );
            }
            ReviewEvent::CategorySkipped { category, error } => {
                warn!(category = %category, error = %error, "Skipping category");
            }
            ReviewEvent::EvaluatorFailed { question_id, error } => {
                warn!(
                    question_id = %question_id,
                    error = %error,
                    "Evaluator failed, using placeholder"
                );
            }
        }
    }
}

/// Observer that records every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ReviewEvent>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events observed so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<ReviewEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of retries that were scheduled.
    #[must_use]
    pub fn retry_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ReviewEvent::RetryScheduled { .. }))
            .count()
    }
}

impl ReviewObserver for RecordingObserver {
    fn observe(&self, event: &ReviewEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
