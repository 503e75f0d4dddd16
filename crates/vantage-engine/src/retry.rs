//! conflict retry with exponential backoff.

use crate::config::RetryPolicy;
use std::future::Future;
use tracing::warn;

/// run `attempt` until it succeeds, fails with a non-conflict error, or the
/// policy runs out of attempts. each attempt starts over from scratch.
pub(crate) async fn retry_on_conflict<T, E, F, Fut>(
    policy: &RetryPolicy,
    is_conflict: fn(&E) -> bool,
    mut attempt: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut current = 1;
    loop {
        match attempt(current).await {
            Err(err) if is_conflict(&err) && current < max_attempts => {
                let delay = policy.backoff(current);
                warn!(attempt = current, ?delay, "conflict, retrying from the start");
                tokio::time::sleep(delay).await;
                current += 1;
            }
            other => return other,
        }
    }
}
