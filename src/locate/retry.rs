use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};

use crate::dom::{Document, ElementState};

use super::error::LocateError;
use super::orchestrator::resolve;
use super::{LocatorResult, ResolutionOptions};

/// Fixed delay between resolution attempts.
const RETRY_DELAY: Duration = Duration::from_millis(250);

/// Poll interval for state waits.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Budget for a single lifecycle-state check within one poll iteration.
const STATE_CHECK_TIMEOUT: Duration = Duration::from_secs(1);

/// Resolve with bounded retries. The overall timeout is split evenly across
/// attempts; each attempt races full resolution against its slice. Gives up
/// silently; a `None` only becomes an error at the action boundary.
///
/// Every attempt is a fresh query pass. Nothing is carried over from failed
/// attempts, so a document that mutated between attempts is re-seen from
/// scratch and no stale handle survives.
pub async fn resolve_with_retry(
    doc: &dyn Document,
    description: &str,
    options: &ResolutionOptions,
) -> Option<LocatorResult> {
    let attempts = options.max_retries.max(1);
    let per_attempt = options.timeout / attempts;

    for attempt in 1..=attempts {
        match timeout(per_attempt, resolve(doc, description, options)).await {
            Ok(Some(result)) => {
                tracing::debug!(
                    "resolved '{}' via {} on attempt {}/{}",
                    description,
                    result.strategy,
                    attempt,
                    attempts
                );
                return Some(result);
            }
            Ok(None) => {
                tracing::trace!("attempt {}/{} found nothing for '{}'", attempt, attempts, description);
            }
            Err(_) => {
                tracing::debug!(
                    "attempt {}/{} timed out after {:?} for '{}'",
                    attempt,
                    attempts,
                    per_attempt,
                    description
                );
            }
        }
        if attempt < attempts {
            sleep(RETRY_DELAY).await;
        }
    }
    None
}

/// Poll until an element matching the description exists and reaches the
/// requested lifecycle state, or fail with a timeout carrying the last
/// observed sub-error.
///
/// Resolution reruns on every poll: the target may not exist yet, may be
/// replaced, or may change state between iterations, so holding on to an
/// earlier handle would go stale.
pub async fn wait_for(
    doc: &dyn Document,
    description: &str,
    state: ElementState,
    options: &ResolutionOptions,
) -> Result<LocatorResult, LocateError> {
    let deadline = Instant::now() + options.timeout;
    let mut last_error: Option<String> = None;

    loop {
        if let Some(result) = resolve(doc, description, options).await {
            match doc
                .wait_for_state(result.element, state, STATE_CHECK_TIMEOUT)
                .await
            {
                Ok(()) => return Ok(result),
                Err(err) => last_error = Some(format!("{err:#}")),
            }
        }

        if Instant::now() >= deadline {
            return Err(LocateError::Timeout {
                description: description.to_string(),
                timeout_ms: options.timeout.as_millis() as u64,
                last_error,
            });
        }
        sleep(POLL_INTERVAL).await;
    }
}
