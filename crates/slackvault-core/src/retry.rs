//! Retrying invoker for remote calls.
//!
//! Rate limits are absorbed: the caller is suspended for exactly the
//! server-specified duration and the same call is issued again, with no retry
//! ceiling. Cancellation is the only way out of a persistent rate limit.

use std::future::Future;
use std::time::Duration;

use slackvault_traits::SlackError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Execute `call`, re-issuing it after every rate limit until it succeeds,
/// fails with another error, or `cancel` fires.
///
/// Terminal remote errors are classified with [`Error::remote`] under
/// `operation`. Cancellation returns [`Error::Cancelled`] unwrapped.
pub async fn with_retry<T, F, Fut>(
    cancel: &CancellationToken,
    operation: &'static str,
    mut call: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = slackvault_traits::Result<T>>,
{
    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(operation, "Cancelled during API call");
                return Err(Error::Cancelled);
            }
            outcome = call() => outcome,
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(SlackError::RateLimited { retry_after }) => {
                warn!(
                    operation,
                    retry_after_ms = saturating_millis(retry_after),
                    "Rate limit hit, waiting before retry"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!(operation, "Cancelled during rate limit wait");
                        return Err(Error::Cancelled);
                    }
                    _ = tokio::time::sleep(retry_after) => {
                        info!(operation, "Retrying after rate limit wait");
                    }
                }
            }
            Err(err) => return Err(Error::remote(operation, err)),
        }
    }
}
