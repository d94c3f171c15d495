//! Timeout utilities for page operations
//!
//! Every awaited browser operation goes through here so that a stalled page
//! surfaces as a typed failure instead of a hang.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Wrap an async page operation with an explicit timeout
///
/// `on_timeout` builds the error reported when `timeout` elapses, which lets
/// each call site pick the variant that describes what was being waited on
/// (navigation, download start, ...).
///
/// # Returns
/// * `Ok(T)` - Operation completed successfully
/// * `Err` - Either the operation failed or the timeout was reached
pub async fn with_page_timeout<F, T, E>(
    operation: F,
    timeout: Duration,
    on_timeout: E,
) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
    E: FnOnce() -> FetchError,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout()),
    }
}
