use log::{debug, warn};
use std::fmt::Display;
use std::future::Future;
use tokio::time::Instant;

/// Runs `operation` and logs one `account= operation= result= duration=` line for it.
pub async fn observe<T, E, F>(account: &str, operation: &str, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let started = Instant::now();
    let result = fut.await;
    let duration = started.elapsed();

    match &result {
        Ok(_) => debug!(
            "account={account} operation={operation} result=ok duration={duration:?}"
        ),
        Err(e) => warn!(
            "account={account} operation={operation} result=error duration={duration:?} error={e}"
        ),
    }

    result
}
