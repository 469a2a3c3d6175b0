//! Paced invocation of fallible async operations.
//!
//! Neither helper swallows errors: an `Err` from the operation is returned
//! as-is. Cancellation happens by dropping the returned future.
use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Calls `op` until `is_done` accepts its output, starting attempts at most once per `interval`.
pub async fn retry_until<T, E, F, Fut, P>(interval: Duration, is_done: P, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&T) -> bool,
{
    loop {
        let started = Instant::now();
        let output = op().await?;
        if is_done(&output) {
            return Ok(output);
        }
        sleep(interval.saturating_sub(started.elapsed())).await;
    }
}

/// Calls `op` forever, starting calls at most once per `interval`. Only returns on error.
pub async fn repeat_forever<E, F, Fut>(interval: Duration, mut op: F) -> Result<Infallible, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    loop {
        let started = Instant::now();
        op().await?;
        sleep(interval.saturating_sub(started.elapsed())).await;
    }
}
