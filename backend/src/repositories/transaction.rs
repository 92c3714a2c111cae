//! Transaction management utilities for repositories.

use std::future::Future;
use std::time::Duration;

use sqlx::postgres::PgTransaction;
use sqlx::PgPool;

use crate::error::LedgerError;

/// Begin a new database transaction.
///
/// On success, the transaction can be committed via [`commit_transaction`].
/// Dropping it without committing rolls it back.
pub async fn begin_transaction(db: &PgPool) -> Result<PgTransaction<'static>, LedgerError> {
    Ok(db.begin().await?)
}

/// Commit a transaction.
pub async fn commit_transaction(tx: PgTransaction<'_>) -> Result<(), LedgerError> {
    Ok(tx.commit().await?)
}

/// Bounded replay of transactions that failed for transient reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Backoff before attempt `attempt + 1` (doubles each time).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// `policy.max_attempts` is reached. Each attempt must open its own transaction.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &'static str,
    mut operation: F,
) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient store failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(LedgerError::Store(err)) => {
                tracing::error!(operation = operation_name, attempt, error = %err, "store failure");
                return Err(LedgerError::Store(err));
            }
            other => return other,
        }
    }
}
