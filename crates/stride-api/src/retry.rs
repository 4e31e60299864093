//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use stride_core::error::ErrorKind;

/// Runs `op`, retrying with exponential backoff (`2^attempt` seconds) up to
/// `max_retries` additional attempts.
///
/// Non-transient failures (`Unauthorized`, `Validation`) fail fast without
/// a retry. When attempts are exhausted the error of the last attempt is
/// returned.
pub async fn with_retry<T, F, Fut>(max_retries: u32, mut op: F) -> Result<T, ErrorKind>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ErrorKind>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(kind) => {
                if !kind.is_retryable() || attempt >= max_retries {
                    return Err(kind);
                }
                let delay = Duration::from_secs(2u64.saturating_pow(attempt));
                debug!(?kind, attempt, ?delay, "retrying after backoff");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn unauthorized_is_invoked_exactly_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ErrorKind::Unauthorized) }
        })
        .await;

        assert_eq!(result.unwrap_err(), ErrorKind::Unauthorized);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn validation_is_invoked_exactly_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ErrorKind::Validation) }
        })
        .await;

        assert_eq!(result.unwrap_err(), ErrorKind::Validation);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_retry_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry(3, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ErrorKind::Server)
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_return_the_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(2, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ErrorKind::Server)
                } else {
                    Err(ErrorKind::Timeout)
                }
            }
        })
        .await;

        // max_retries = 2 means one initial call plus two retries.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err(), ErrorKind::Timeout);
    }
}
