//! Bounded waiting around ledger operations.
//!
//! Dropping the wrapped future on expiry drops any open
//! `DatabaseTransaction` with it, which rolls the transaction back.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::{CoreError, CoreResult};

pub async fn with_deadline<F, T>(limit: Duration, operation: F) -> CoreResult<T>
where
    F: Future<Output = CoreResult<T>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => {
            warn!(timeout_ms = limit.as_millis() as u64, "Ledger operation timed out");
            Err(CoreError::Timeout(limit))
        }
    }
}
