use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use tracepost_event::CollectorError;

const INITIAL_INTERVAL: Duration = Duration::from_secs(1);
const MULTIPLIER: f64 = 2.0;

/// Runs `op` under exponential backoff: 1 s initial interval, doubling
/// per attempt, at most `max_retry` retries after the first attempt.
///
/// Errors whose kind is non-retryable short-circuit immediately; the
/// caller gets the last error back once retries are exhausted.
pub(crate) async fn with_backoff<T, E, F, Fut>(
    max_retry: u32,
    mut op: F,
) -> Result<T, E>
where
    E: CollectorError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = AtomicU32::new(0);
    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(INITIAL_INTERVAL)
        .with_multiplier(MULTIPLIER)
        .with_max_elapsed_time(None)
        .build();
    backoff::future::retry(policy, || {
        let attempt = attempts.fetch_add(1, Ordering::Relaxed);
        let fut = op();
        async move {
            match fut.await {
                Ok(value) => Ok(value),
                Err(err)
                    if err.kind().is_retryable() && attempt < max_retry =>
                {
                    debug!(
                        "attempt {} failed, will retry: {err}",
                        attempt + 1
                    );
                    Err(backoff::Error::transient(err))
                }
                Err(err) => Err(backoff::Error::permanent(err)),
            }
        }
    })
    .await
}
