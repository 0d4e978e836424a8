//! Bounded retry with exponential backoff for warehouse reads.
//!
//! Attribute queries go through [`with_retry`] so transient store
//! failures (dropped connections, timeouts) get a bounded number of
//! re-attempts before the request fails. Conversion failures are
//! permanent and never retried.

use std::time::Duration;

use crate::WarehouseError;

/// Default number of re-attempts for transient failures.
///
/// With exponential backoff (400ms, 800ms, 1.6s) the total wait before
/// giving up is 2.8 seconds, comfortably inside the per-request bound.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base backoff delay; doubles per attempt.
const BASE_DELAY_MS: u64 = 200;

/// Runs a warehouse operation, retrying transient failures.
///
/// The `run` closure is called once per attempt so each retry issues a
/// fresh query. Permanent errors return immediately.
///
/// # Errors
///
/// Returns the last error once `max_retries` transient failures have
/// been exhausted, or the first permanent error encountered.
pub async fn with_retry<T, F, Fut>(
    operation: &str,
    max_retries: u32,
    run: F,
) -> Result<T, WarehouseError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, WarehouseError>>,
{
    let mut last_error: Option<WarehouseError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_millis(BASE_DELAY_MS << attempt);
            log::warn!("Retrying '{operation}' ({attempt}/{max_retries}) in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match run().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_retries => {
                log::warn!("Transient failure in '{operation}': {e}");
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| WarehouseError::Conversion {
        message: format!("'{operation}' failed after {max_retries} retries"),
    }))
}
