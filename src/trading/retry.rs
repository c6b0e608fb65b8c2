//! Bounded fixed-delay retry for dependent order placement.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use tracing::warn;

/// Backoff policy allowing `max_attempts` total attempts with a constant
/// delay between them.
#[derive(Debug, Clone)]
pub struct FixedRetry {
    max_attempts: u32,
    delay: Duration,
    attempts: u32,
}

impl FixedRetry {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            attempts: 1,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Backoff for FixedRetry {
    fn reset(&mut self) {
        self.attempts = 1;
    }

    /// Called after a failed attempt; `None` ends the retry loop.
    fn next_backoff(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(self.delay)
    }
}

/// Run `operation` under `policy`, stopping on the first success. After the
/// last attempt fails, its error is returned.
pub async fn retry_fixed<T, E, F, Fut>(
    policy: FixedRetry,
    label: &str,
    mut operation: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts();

    backoff::future::retry_notify(
        policy,
        || {
            let fut = operation();
            async move { fut.await.map_err(backoff::Error::transient) }
        },
        |err: E, wait: Duration| {
            warn!(
                operation = label,
                max_attempts,
                wait_secs = wait.as_secs_f64(),
                error = %err,
                "Attempt failed, retrying"
            );
        },
    )
    .await
}
