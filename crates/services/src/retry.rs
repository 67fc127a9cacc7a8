use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Bounded retry budget for transient storage failures.
///
/// Three attempts with a doubling delay; the third failure propagates.
pub(crate) const ATTEMPTS: u32 = 3;
pub(crate) const BASE_DELAY: Duration = Duration::from_millis(100);

/// Retry `op` on transient errors only, sleeping between attempts.
///
/// Non-transient errors (conflicts, rejections, validation) return on the
/// first occurrence; the overall operation still reports once to the
/// caller either way.
pub(crate) async fn with_backoff<T, E, F, Fut>(
    name: &'static str,
    is_transient: fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry(name, ATTEMPTS, BASE_DELAY, is_transient, &mut op).await
}

async fn retry<T, E, F, Fut>(
    name: &'static str,
    attempts: u32,
    base_delay: Duration,
    is_transient: fn(&E) -> bool,
    op: &mut F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = base_delay;
    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts && is_transient(&err) => {
                warn!(%err, attempt, "{name} failed; retrying");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(err) => return Err(err),
        }
    }
    unreachable!("loop returns on the final attempt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("transient")]
        Transient,
        #[error("fatal")]
        Fatal,
    }

    fn transient_only(e: &TestError) -> bool {
        matches!(e, TestError::Transient)
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = retry(
            "op",
            3,
            Duration::from_millis(1),
            transient_only,
            &mut || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(TestError::Transient)
                    } else {
                        Ok(n)
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_errors_do_not_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry(
            "op",
            3,
            Duration::from_millis(1),
            transient_only,
            &mut || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError::Fatal) }
            },
        )
        .await;

        assert!(matches!(result.unwrap_err(), TestError::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn budget_exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry(
            "op",
            3,
            Duration::from_millis(1),
            transient_only,
            &mut || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError::Transient) }
            },
        )
        .await;

        assert!(matches!(result.unwrap_err(), TestError::Transient));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
