//! Per-call deadlines for datastore operations.

use std::future::Future;
use std::time::Duration;

use teachshare_core::AppError;

/// Run `fut`, failing with [`AppError::Timeout`] once `limit` elapses.
///
/// The inner future is dropped on timeout, which cancels the in-flight query.
pub async fn with_deadline<T, F>(limit: Duration, operation: &'static str, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                operation = operation,
                timeout_ms = limit.as_millis() as u64,
                "Database call exceeded its deadline"
            );
            Err(AppError::Timeout(format!(
                "{} did not complete within {}ms",
                operation,
                limit.as_millis()
            )))
        }
    }
}
