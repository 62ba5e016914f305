//! Bounded waits for in-flight operations.
//!
//! [`with_timeout`] bounds how long the *caller* waits; it does not stop the
//! underlying work. The operation runs as a detached tokio task, so when the
//! timer wins the task keeps running to completion and its side effects are
//! not retracted. Callers that want the work stopped use
//! [`with_timeout_cancelling`], which drops the future on expiry.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinError;

use crate::error::{ClassifiedError, ErrorKind, Fault, Severity};

/// Metadata key carrying the timeout that fired, in milliseconds.
pub const TIMEOUT_MS_KEY: &str = "timeoutMs";

/// Races `future` against a `ms` millisecond timer.
///
/// On expiry resolves to a TIMEOUT_ERROR with `metadata.timeoutMs == ms`; the
/// spawned task is left running. A panic in the task becomes a critical
/// SYSTEM_ERROR. Must be called from within a tokio runtime.
pub async fn with_timeout<F, T>(future: F, ms: u64) -> Result<T, Fault>
where
    F: Future<Output = Result<T, Fault>> + Send + 'static,
    T: Send + 'static,
{
    let mut handle = tokio::spawn(future);
    match tokio::time::timeout(Duration::from_millis(ms), &mut handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(join_failure(join_error).into()),
        Err(_) => {
            tracing::debug!(timeout_ms = ms, "timeout fired, operation left running");
            Err(timeout_error(ms).into())
        }
    }
}

/// Like [`with_timeout`], but the operation is dropped (cancelled) on expiry.
pub async fn with_timeout_cancelling<F, T>(future: F, ms: u64) -> Result<T, Fault>
where
    F: Future<Output = Result<T, Fault>>,
{
    match tokio::time::timeout(Duration::from_millis(ms), future).await {
        Ok(result) => result,
        Err(_) => {
            tracing::debug!(timeout_ms = ms, "timeout fired, operation cancelled");
            Err(timeout_error(ms).into())
        }
    }
}

/// The TIMEOUT_ERROR produced when a wait of `ms` milliseconds expires.
pub fn timeout_error(ms: u64) -> ClassifiedError {
    ClassifiedError::new(
        ErrorKind::Timeout,
        Severity::Medium,
        format!("Operation timed out after {ms}ms"),
    )
    .with_metadata(TIMEOUT_MS_KEY, ms)
}

fn join_failure(error: JoinError) -> ClassifiedError {
    let reason = if error.is_panic() {
        "operation panicked"
    } else {
        "operation task was cancelled"
    };
    ClassifiedError::new(ErrorKind::System, Severity::Critical, reason)
        .with_metadata("joinError", error.to_string())
}
