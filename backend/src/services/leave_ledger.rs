//! Leave ledger: per-user balances and the approval state machine of leave
//! requests.
//!
//! Every transition that touches a balance runs in one transaction that first
//! locks the request row, re-checks the state machine, then writes the request
//! and the balance. Two approvals racing on one request therefore serialize on
//! the row lock and the second one observes a non-pending status.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use sqlx::PgPool;

use crate::config::Config;
use crate::error::LedgerError;
use crate::models::leave_balance::{LeaveAllotments, LeaveBalance};
use crate::models::leave_request::{
    CancellationEffect, LeaveHistoryFilter, LeaveRequest, LeaveSubmission, NewLeaveRequest,
    PendingLeaveRequest,
};
use crate::models::notification::{Notification, NOTIFICATION_LIMIT, NOTIFICATION_WINDOW_DAYS};
use crate::models::request::RequestStatus;
use crate::repositories::transaction::{begin_transaction, commit_transaction};
use crate::repositories::{
    with_retry, LeaveBalanceRepository, LeaveBalanceRepositoryTrait, LeaveRequestRepository,
    LeaveRequestRepositoryTrait, RetryPolicy,
};
use crate::types::{LeaveRequestId, TeamId, UserId};
use crate::utils::time::{count_working_days, today_local};

#[derive(Clone)]
pub struct LeaveLedger {
    pool: PgPool,
    balances: Arc<dyn LeaveBalanceRepositoryTrait>,
    requests: Arc<dyn LeaveRequestRepositoryTrait>,
    allotments: LeaveAllotments,
    time_zone: Tz,
    retry: RetryPolicy,
}

fn request_not_found() -> LedgerError {
    LedgerError::NotFound("Leave request not found".to_string())
}

impl LeaveLedger {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        Self::with_repositories(
            pool,
            Arc::new(LeaveBalanceRepository::new()),
            Arc::new(LeaveRequestRepository::new()),
            config.leave_allotments,
            config.time_zone,
            RetryPolicy::new(
                config.tx_max_attempts,
                Duration::from_millis(config.tx_retry_base_ms),
            ),
        )
    }

    pub fn with_repositories(
        pool: PgPool,
        balances: Arc<dyn LeaveBalanceRepositoryTrait>,
        requests: Arc<dyn LeaveRequestRepositoryTrait>,
        allotments: LeaveAllotments,
        time_zone: Tz,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            pool,
            balances,
            requests,
            allotments,
            time_zone,
            retry,
        }
    }

    pub fn allotments(&self) -> LeaveAllotments {
        self.allotments
    }

    fn today(&self) -> NaiveDate {
        today_local(&self.time_zone)
    }

    /// Returns the user's balance, creating it with the default allotments
    /// on first access.
    pub async fn get_or_create_balance(&self, user_id: UserId) -> Result<LeaveBalance, LedgerError> {
        if let Some(balance) = self.balances.find_by_user(&self.pool, user_id).await? {
            return Ok(balance);
        }

        match self
            .balances
            .create_default(&self.pool, user_id, self.allotments)
            .await?
        {
            Some(balance) => {
                tracing::info!(user_id = %user_id, "created default leave balance");
                Ok(balance)
            }
            // Lost the insert race to a concurrent first access.
            None => self
                .balances
                .find_by_user(&self.pool, user_id)
                .await?
                .ok_or_else(|| LedgerError::NotFound("Leave balance not found".to_string())),
        }
    }

    /// Validates and stores a new PENDING request. The balance is only
    /// checked here; it is debited on approval.
    pub async fn submit_request(
        &self,
        user_id: UserId,
        input: NewLeaveRequest,
    ) -> Result<LeaveRequest, LedgerError> {
        let submission = LeaveSubmission::parse(input)?;
        let working_days = count_working_days(submission.start_date, submission.end_date);

        let balance = self.get_or_create_balance(user_id).await?;
        let available = balance.available(submission.leave_type);
        if working_days > available {
            tracing::debug!(
                user_id = %user_id,
                leave_type = %submission.leave_type,
                working_days,
                available,
                "leave request exceeds balance"
            );
            return Err(LedgerError::InsufficientBalance {
                requested: working_days,
                available,
            });
        }

        let now = Utc::now();
        let request = LeaveRequest {
            id: LeaveRequestId::new(),
            user_id,
            leave_type: submission.leave_type,
            start_date: submission.start_date,
            end_date: submission.end_date,
            reason: submission.reason,
            working_days,
            status: RequestStatus::Pending,
            approved_by: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        let created = self.requests.create(&self.pool, &request).await?;

        tracing::info!(
            request_id = %created.id,
            user_id = %user_id,
            leave_type = %created.leave_type,
            working_days,
            "leave request submitted"
        );
        Ok(created)
    }

    /// PENDING -> APPROVED, debiting the balance in the same transaction.
    pub async fn approve_request(
        &self,
        request_id: LeaveRequestId,
        approver_id: UserId,
    ) -> Result<LeaveRequest, LedgerError> {
        with_retry(&self.retry, "approve_request", || {
            self.approve_once(request_id, approver_id)
        })
        .await
    }

    async fn approve_once(
        &self,
        request_id: LeaveRequestId,
        approver_id: UserId,
    ) -> Result<LeaveRequest, LedgerError> {
        let mut tx = begin_transaction(&self.pool).await?;
        let request = self
            .requests
            .lock_for_update(&mut *tx, request_id)
            .await?
            .ok_or_else(request_not_found)?;
        request.ensure_transition(RequestStatus::Approved)?;

        let approved = self
            .requests
            .mark_approved(&mut *tx, request_id, approver_id)
            .await?;
        let balance = self
            .balances
            .adjust(
                &mut *tx,
                request.user_id,
                request.leave_type,
                -request.working_days,
            )
            .await?;
        commit_transaction(tx).await?;

        let remaining = balance.available(request.leave_type);
        if remaining < 0 {
            tracing::warn!(
                request_id = %request_id,
                user_id = %request.user_id,
                leave_type = %request.leave_type,
                remaining,
                "approval left a negative leave balance"
            );
        }
        tracing::info!(
            request_id = %request_id,
            user_id = %request.user_id,
            approver_id = %approver_id,
            working_days = request.working_days,
            remaining,
            "leave request approved"
        );
        Ok(approved)
    }

    /// PENDING -> REJECTED. No balance change.
    pub async fn reject_request(
        &self,
        request_id: LeaveRequestId,
        approver_id: UserId,
        reason: &str,
    ) -> Result<LeaveRequest, LedgerError> {
        self.requests
            .find_by_id(&self.pool, request_id)
            .await?
            .ok_or_else(request_not_found)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LedgerError::validation("Rejection reason is required"));
        }

        with_retry(&self.retry, "reject_request", || {
            self.reject_once(request_id, approver_id, reason)
        })
        .await
    }

    async fn reject_once(
        &self,
        request_id: LeaveRequestId,
        approver_id: UserId,
        reason: &str,
    ) -> Result<LeaveRequest, LedgerError> {
        let mut tx = begin_transaction(&self.pool).await?;
        let request = self
            .requests
            .lock_for_update(&mut *tx, request_id)
            .await?
            .ok_or_else(request_not_found)?;
        request.ensure_transition(RequestStatus::Rejected)?;

        let rejected = self
            .requests
            .mark_rejected(&mut *tx, request_id, approver_id, reason)
            .await?;
        commit_transaction(tx).await?;

        tracing::info!(
            request_id = %request_id,
            user_id = %request.user_id,
            approver_id = %approver_id,
            "leave request rejected"
        );
        Ok(rejected)
    }

    /// Owner cancellation before the leave starts. Cancelling an approved
    /// request restores its days in the same transaction.
    pub async fn cancel_request(
        &self,
        request_id: LeaveRequestId,
        caller_id: UserId,
    ) -> Result<LeaveRequest, LedgerError> {
        with_retry(&self.retry, "cancel_request", || {
            self.cancel_once(request_id, caller_id)
        })
        .await
    }

    async fn cancel_once(
        &self,
        request_id: LeaveRequestId,
        caller_id: UserId,
    ) -> Result<LeaveRequest, LedgerError> {
        let mut tx = begin_transaction(&self.pool).await?;
        let request = self
            .requests
            .lock_for_update(&mut *tx, request_id)
            .await?
            .ok_or_else(request_not_found)?;
        let effect = request.cancellation_effect(caller_id, self.today())?;

        let cancelled = self.requests.mark_cancelled(&mut *tx, request_id).await?;
        let restored = match effect {
            CancellationEffect::Restore { leave_type, days } => {
                self.balances
                    .adjust(&mut *tx, request.user_id, leave_type, days)
                    .await?;
                days
            }
            CancellationEffect::StatusOnly => 0,
        };
        commit_transaction(tx).await?;

        tracing::info!(
            request_id = %request_id,
            user_id = %caller_id,
            previous_status = %request.status,
            restored_days = restored,
            "leave request cancelled"
        );
        Ok(cancelled)
    }

    pub async fn list_history(
        &self,
        user_id: UserId,
        filter: LeaveHistoryFilter,
    ) -> Result<Vec<LeaveRequest>, LedgerError> {
        self.requests.list_history(&self.pool, user_id, filter).await
    }

    /// Pending requests of `team_id`, earliest submission first.
    pub async fn list_pending_for_team(
        &self,
        team_id: TeamId,
    ) -> Result<Vec<PendingLeaveRequest>, LedgerError> {
        self.requests.list_pending_for_team(&self.pool, team_id).await
    }

    /// Status feed of the user's requests updated in the last week.
    pub async fn recent_notifications(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Notification>, LedgerError> {
        let since = Utc::now() - chrono::Duration::days(NOTIFICATION_WINDOW_DAYS);
        let requests = self
            .requests
            .recent_for_user(&self.pool, user_id, since, NOTIFICATION_LIMIT)
            .await?;
        Ok(requests.iter().map(Notification::from).collect())
    }
}
