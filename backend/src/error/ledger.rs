//! Error taxonomy of the leave ledger.

use thiserror::Error;

/// PostgreSQL SQLSTATE for `serialization_failure`.
const SERIALIZATION_FAILURE: &str = "40001";
/// PostgreSQL SQLSTATE for `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";

/// Failures surfaced by ledger operations.
///
/// Every variant except [`LedgerError::Store`] is a business-rule failure and is
/// never retried. Store failures are retried only when [`is_retryable`] says so.
///
/// [`is_retryable`]: LedgerError::is_retryable
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),

    #[error("Insufficient leave balance: requested {requested} day(s), {available} available")]
    InsufficientBalance { requested: i32, available: i32 },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Authorization(String),

    #[error("store failure: {0}")]
    Store(#[from] sqlx::Error),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        LedgerError::InvalidState(message.into())
    }

    /// Stable machine-readable kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Validation(_) => "validation",
            LedgerError::InsufficientBalance { .. } => "insufficient_balance",
            LedgerError::NotFound(_) => "not_found",
            LedgerError::InvalidState(_) => "invalid_state",
            LedgerError::Authorization(_) => "authorization",
            LedgerError::Store(_) => "store",
        }
    }

    /// True for transient store failures (serialization failure, deadlock)
    /// that may succeed when the whole transaction is replayed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LedgerError::Store(sqlx::Error::Database(db_err)) => matches!(
                db_err.code().as_deref(),
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
            ),
            LedgerError::Store(sqlx::Error::PoolTimedOut) => true,
            _ => false,
        }
    }
}
