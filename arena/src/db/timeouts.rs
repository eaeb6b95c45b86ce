//! Database query timeout helpers
//!
//! Wraps store queries so a stalled connection surfaces as an error instead
//! of hanging the caller.

use crate::store::{StoreError, StoreResult};
use std::time::Duration;
use tokio::time::timeout;

/// Default timeout for document queries (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for schema setup (30 seconds)
pub const LONG_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Execute a query with timeout
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> StoreResult<T>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    match timeout(duration, future).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(StoreError::Database(e)),
        Err(_) => Err(StoreError::Timeout(duration)),
    }
}

/// Execute a query with default timeout (5 seconds)
pub async fn with_default_timeout<F, T>(future: F) -> StoreResult<T>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    with_timeout(DEFAULT_QUERY_TIMEOUT, future).await
}
