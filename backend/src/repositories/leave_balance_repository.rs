//! Leave balance repository trait for dependency injection and testing.
//!
//! Balance counters are only ever changed with relative updates
//! (`SET col = col + delta`) inside the caller's transaction, so concurrent
//! debits and credits on one row serialize on its row lock without lost updates.

use async_trait::async_trait;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::error::LedgerError;
use crate::models::leave_balance::{LeaveAllotments, LeaveBalance};
use crate::models::leave_request::LeaveType;
use crate::repositories::common::LEAVE_BALANCE_COLUMNS;
use crate::types::{LeaveBalanceId, UserId};

/// Repository trait for LeaveBalance operations.
///
/// Use `MockLeaveBalanceRepositoryTrait` in tests to mock the behavior.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaveBalanceRepositoryTrait: Send + Sync {
    /// Find the balance row of a user.
    async fn find_by_user(
        &self,
        db: &PgPool,
        user_id: UserId,
    ) -> Result<Option<LeaveBalance>, LedgerError>;

    /// Insert a row seeded from `allotments`. Returns `None` when the user
    /// already has one.
    async fn create_default(
        &self,
        db: &PgPool,
        user_id: UserId,
        allotments: LeaveAllotments,
    ) -> Result<Option<LeaveBalance>, LedgerError>;

    /// Add `delta` (negative to debit) to the counter of `leave_type`.
    async fn adjust(
        &self,
        conn: &mut PgConnection,
        user_id: UserId,
        leave_type: LeaveType,
        delta: i32,
    ) -> Result<LeaveBalance, LedgerError>;
}

/// Concrete implementation of LeaveBalanceRepositoryTrait
#[derive(Debug, Default, Clone, Copy)]
pub struct LeaveBalanceRepository;

impl LeaveBalanceRepository {
    pub fn new() -> Self {
        Self
    }

    /// Insert-if-absent on any executor, so registration can run it inside
    /// the transaction that creates the user.
    pub async fn insert_default<'e, E>(
        executor: E,
        user_id: UserId,
        allotments: LeaveAllotments,
    ) -> Result<Option<LeaveBalance>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO leave_balances \
             (id, user_id, annual, sick, maternity, paternity, bereavement) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (user_id) DO NOTHING \
             RETURNING {}",
            LEAVE_BALANCE_COLUMNS
        );
        sqlx::query_as::<_, LeaveBalance>(&query)
            .bind(LeaveBalanceId::new())
            .bind(user_id)
            .bind(allotments.annual)
            .bind(allotments.sick)
            .bind(allotments.maternity)
            .bind(allotments.paternity)
            .bind(allotments.bereavement)
            .fetch_optional(executor)
            .await
    }
}

#[async_trait]
impl LeaveBalanceRepositoryTrait for LeaveBalanceRepository {
    async fn find_by_user(
        &self,
        db: &PgPool,
        user_id: UserId,
    ) -> Result<Option<LeaveBalance>, LedgerError> {
        let query = format!(
            "SELECT {} FROM leave_balances WHERE user_id = $1",
            LEAVE_BALANCE_COLUMNS
        );
        let row = sqlx::query_as::<_, LeaveBalance>(&query)
            .bind(user_id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn create_default(
        &self,
        db: &PgPool,
        user_id: UserId,
        allotments: LeaveAllotments,
    ) -> Result<Option<LeaveBalance>, LedgerError> {
        Ok(Self::insert_default(db, user_id, allotments).await?)
    }

    async fn adjust(
        &self,
        conn: &mut PgConnection,
        user_id: UserId,
        leave_type: LeaveType,
        delta: i32,
    ) -> Result<LeaveBalance, LedgerError> {
        // The column name comes from an exhaustive match, never from input.
        let column = leave_type.balance_column();
        let query = format!(
            "UPDATE leave_balances SET {column} = {column} + $2, updated_at = NOW() \
             WHERE user_id = $1 RETURNING {}",
            LEAVE_BALANCE_COLUMNS
        );
        sqlx::query_as::<_, LeaveBalance>(&query)
            .bind(user_id)
            .bind(delta)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| LedgerError::NotFound("Leave balance not found".into()))
    }
}
