//! Leave request repository trait for dependency injection and testing.
//!
//! This module defines the LeaveRequestRepositoryTrait which can be mocked
//! using mockall for testing purposes. Status writes take a connection so
//! they run inside the caller's transaction, after [`lock_for_update`].
//!
//! [`lock_for_update`]: LeaveRequestRepositoryTrait::lock_for_update

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::error::LedgerError;
use crate::models::leave_request::{LeaveHistoryFilter, LeaveRequest, PendingLeaveRequest};
use crate::models::request::RequestStatus;
use crate::repositories::common::{push_clause, LEAVE_REQUEST_COLUMNS};
use crate::types::{LeaveRequestId, TeamId, UserId};

/// Repository trait for LeaveRequest operations.
///
/// Use `MockLeaveRequestRepositoryTrait` in tests to mock the behavior.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaveRequestRepositoryTrait: Send + Sync {
    /// Insert a new leave request
    async fn create(&self, db: &PgPool, item: &LeaveRequest) -> Result<LeaveRequest, LedgerError>;

    /// Find a leave request by ID
    async fn find_by_id(
        &self,
        db: &PgPool,
        id: LeaveRequestId,
    ) -> Result<Option<LeaveRequest>, LedgerError>;

    /// Read a leave request and hold its row lock until the transaction ends
    async fn lock_for_update(
        &self,
        conn: &mut PgConnection,
        id: LeaveRequestId,
    ) -> Result<Option<LeaveRequest>, LedgerError>;

    /// Set status APPROVED and record the approver
    async fn mark_approved(
        &self,
        conn: &mut PgConnection,
        id: LeaveRequestId,
        approver_id: UserId,
    ) -> Result<LeaveRequest, LedgerError>;

    /// Set status REJECTED with the approver and the rejection reason
    async fn mark_rejected(
        &self,
        conn: &mut PgConnection,
        id: LeaveRequestId,
        approver_id: UserId,
        reason: &str,
    ) -> Result<LeaveRequest, LedgerError>;

    /// Set status CANCELLED
    async fn mark_cancelled(
        &self,
        conn: &mut PgConnection,
        id: LeaveRequestId,
    ) -> Result<LeaveRequest, LedgerError>;

    /// Requests owned by a user, newest first
    async fn list_history(
        &self,
        db: &PgPool,
        user_id: UserId,
        filter: LeaveHistoryFilter,
    ) -> Result<Vec<LeaveRequest>, LedgerError>;

    /// Pending requests of a team, oldest first
    async fn list_pending_for_team(
        &self,
        db: &PgPool,
        team_id: TeamId,
    ) -> Result<Vec<PendingLeaveRequest>, LedgerError>;

    /// Requests of a user updated since `since`, most recently updated first
    async fn recent_for_user(
        &self,
        db: &PgPool,
        user_id: UserId,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<LeaveRequest>, LedgerError>;
}

/// Concrete implementation of LeaveRequestRepositoryTrait
#[derive(Debug, Default, Clone, Copy)]
pub struct LeaveRequestRepository;

impl LeaveRequestRepository {
    pub fn new() -> Self {
        Self
    }
}

async fn update_status(
    conn: &mut PgConnection,
    id: LeaveRequestId,
    status: RequestStatus,
    approver_id: Option<UserId>,
    rejection_reason: Option<&str>,
) -> Result<LeaveRequest, LedgerError> {
    let query = format!(
        "UPDATE leave_requests SET status = $2, \
         approved_by = COALESCE($3, approved_by), \
         rejection_reason = COALESCE($4, rejection_reason), \
         updated_at = NOW() \
         WHERE id = $1 RETURNING {}",
        LEAVE_REQUEST_COLUMNS
    );
    sqlx::query_as::<_, LeaveRequest>(&query)
        .bind(id)
        .bind(status.db_value())
        .bind(approver_id)
        .bind(rejection_reason)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| LedgerError::NotFound("Leave request not found".into()))
}

#[async_trait]
impl LeaveRequestRepositoryTrait for LeaveRequestRepository {
    async fn create(&self, db: &PgPool, item: &LeaveRequest) -> Result<LeaveRequest, LedgerError> {
        let query = format!(
            "INSERT INTO leave_requests ({0}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {0}",
            LEAVE_REQUEST_COLUMNS
        );
        let row = sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(item.id)
            .bind(item.user_id)
            .bind(item.leave_type.db_value())
            .bind(item.start_date)
            .bind(item.end_date)
            .bind(&item.reason)
            .bind(item.working_days)
            .bind(item.status.db_value())
            .bind(item.approved_by)
            .bind(&item.rejection_reason)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    async fn find_by_id(
        &self,
        db: &PgPool,
        id: LeaveRequestId,
    ) -> Result<Option<LeaveRequest>, LedgerError> {
        let query = format!(
            "SELECT {} FROM leave_requests WHERE id = $1",
            LEAVE_REQUEST_COLUMNS
        );
        let row = sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn lock_for_update(
        &self,
        conn: &mut PgConnection,
        id: LeaveRequestId,
    ) -> Result<Option<LeaveRequest>, LedgerError> {
        let query = format!(
            "SELECT {} FROM leave_requests WHERE id = $1 FOR UPDATE",
            LEAVE_REQUEST_COLUMNS
        );
        let row = sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row)
    }

    async fn mark_approved(
        &self,
        conn: &mut PgConnection,
        id: LeaveRequestId,
        approver_id: UserId,
    ) -> Result<LeaveRequest, LedgerError> {
        update_status(conn, id, RequestStatus::Approved, Some(approver_id), None).await
    }

    async fn mark_rejected(
        &self,
        conn: &mut PgConnection,
        id: LeaveRequestId,
        approver_id: UserId,
        reason: &str,
    ) -> Result<LeaveRequest, LedgerError> {
        update_status(
            conn,
            id,
            RequestStatus::Rejected,
            Some(approver_id),
            Some(reason),
        )
        .await
    }

    async fn mark_cancelled(
        &self,
        conn: &mut PgConnection,
        id: LeaveRequestId,
    ) -> Result<LeaveRequest, LedgerError> {
        update_status(conn, id, RequestStatus::Cancelled, None, None).await
    }

    async fn list_history(
        &self,
        db: &PgPool,
        user_id: UserId,
        filter: LeaveHistoryFilter,
    ) -> Result<Vec<LeaveRequest>, LedgerError> {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM leave_requests",
            LEAVE_REQUEST_COLUMNS
        ));
        let mut has_clause = false;

        push_clause(&mut builder, &mut has_clause);
        builder.push("user_id = ").push_bind(user_id);

        if let Some(status) = filter.status {
            push_clause(&mut builder, &mut has_clause);
            builder.push("status = ").push_bind(status.db_value());
        }
        if let Some(leave_type) = filter.leave_type {
            push_clause(&mut builder, &mut has_clause);
            builder.push("leave_type = ").push_bind(leave_type.db_value());
        }
        if let Some(from) = filter.from {
            push_clause(&mut builder, &mut has_clause);
            builder.push("start_date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            push_clause(&mut builder, &mut has_clause);
            builder.push("start_date <= ").push_bind(to);
        }

        builder.push(" ORDER BY created_at DESC, id DESC");

        let rows = builder
            .build_query_as::<LeaveRequest>()
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn list_pending_for_team(
        &self,
        db: &PgPool,
        team_id: TeamId,
    ) -> Result<Vec<PendingLeaveRequest>, LedgerError> {
        let columns = LEAVE_REQUEST_COLUMNS
            .split(", ")
            .map(|column| format!("lr.{}", column.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT {}, u.name AS requester_name, u.email AS requester_email \
             FROM leave_requests lr \
             INNER JOIN users u ON u.id = lr.user_id \
             WHERE u.team_id = $1 AND lr.status = $2 \
             ORDER BY lr.created_at ASC, lr.id ASC",
            columns
        );
        let rows = sqlx::query_as::<_, PendingLeaveRequest>(&query)
            .bind(team_id)
            .bind(RequestStatus::Pending.db_value())
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn recent_for_user(
        &self,
        db: &PgPool,
        user_id: UserId,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<LeaveRequest>, LedgerError> {
        let query = format!(
            "SELECT {} FROM leave_requests \
             WHERE user_id = $1 AND updated_at >= $2 \
             ORDER BY updated_at DESC LIMIT $3",
            LEAVE_REQUEST_COLUMNS
        );
        let rows = sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(user_id)
            .bind(since)
            .bind(limit)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_leave_request_repository_can_be_created() {
        let _mock = MockLeaveRequestRepositoryTrait::new();
    }

    #[test]
    fn test_mock_leave_request_repository_trait_bounds() {
        fn check_send_sync<T: Send + Sync>() {}
        check_send_sync::<MockLeaveRequestRepositoryTrait>();
    }
}
