//! Retry with exponential backoff for transient HTTP failures.
//!
//! Only errors for which [`ScraperError::is_transient`] holds are retried.
//! Malformed bodies, 404s and other client errors are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Upper bound on a server-requested `Retry-After` wait.
pub(crate) const MAX_RETRY_AFTER_SECS: u64 = 60;

/// Seconds to wait before retry number `attempt + 1`.
///
/// Exponential backoff, raised to the server's `Retry-After` (capped at
/// [`MAX_RETRY_AFTER_SECS`]) when the error is a 429.
fn retry_delay_secs(err: &ScraperError, attempt: u32, backoff_base_secs: u64) -> u64 {
    // Cap the shift so extreme configs saturate instead of overflowing.
    let backoff = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
    match err {
        ScraperError::RateLimited {
            retry_after_secs, ..
        } => backoff.max((*retry_after_secs).min(MAX_RETRY_AFTER_SECS)),
        _ => backoff,
    }
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// The wait before the n-th retry is `backoff_base_secs * 2^(n-1)` seconds,
/// or the rate limit's `Retry-After` when that is longer.
/// With `max_retries = 3` the operation is attempted at most 4 times total.
/// If all retries are exhausted the last error is returned.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !err.is_transient() || attempt >= max_retries {
            return Err(err);
        }

        let delay_secs = retry_delay_secs(&err, attempt, backoff_base_secs);
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient scraper error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
