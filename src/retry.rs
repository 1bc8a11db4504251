use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::errors::AppResult;

/// Runs `operation` up to `max_attempts` times, sleeping
/// `base_delay * 2^attempt` between retryable failures. Non-retryable errors
/// and the final failure propagate unchanged.
pub async fn retry_with_backoff<T, F, Fut>(
    mut operation: F,
    max_attempts: u32,
    base_delay: Duration,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < max_attempts => {
                let delay = backoff_delay(base_delay, attempt);
                warn!(
                    ?err,
                    attempt, "retryable provider error; backing off {:?}", delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    // Exponent capped so a runaway attempt counter cannot overflow.
    base * 2u32.saturating_pow(attempt.min(16))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::errors::AppError;

    #[test]
    fn backoff_delays_strictly_increase() {
        let base = Duration::from_millis(100);
        let delays: Vec<Duration> = (0..4).map(|attempt| backoff_delay(base, attempt)).collect();
        assert_eq!(delays[0], Duration::from_millis(100));
        assert_eq!(delays[1], Duration::from_millis(200));
        assert_eq!(delays[2], Duration::from_millis(400));
        assert!(delays.windows(2).all(|pair| pair[1] > pair[0]));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_retryable_errors_until_exhausted() {
        let attempts = AtomicU32::new(0);
        let result: AppResult<()> = retry_with_backoff(
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::provider(Some(500), "flaky upstream")) }
            },
            3,
            Duration::from_millis(10),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let attempts = AtomicU32::new(0);
        let result = retry_with_backoff(
            || {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err(AppError::provider(Some(429), "slow down"))
                    } else {
                        Ok(attempt)
                    }
                }
            },
            5,
            Duration::from_millis(10),
        )
        .await
        .unwrap();

        assert_eq!(result, 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_errors_propagate_immediately() {
        let attempts = AtomicU32::new(0);
        let result: AppResult<()> = retry_with_backoff(
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::provider(Some(403), "key rejected")) }
            },
            5,
            Duration::from_millis(10),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_messages_are_retried() {
        let attempts = AtomicU32::new(0);
        let result = retry_with_backoff(
            || {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err(AppError::provider(None, "request ETIMEDOUT"))
                    } else {
                        Ok("recovered")
                    }
                }
            },
            3,
            Duration::from_millis(10),
        )
        .await
        .unwrap();

        assert_eq!(result, "recovered");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
