//! Per-user remaining leave allotments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::leave_request::LeaveType;
use crate::types::{LeaveBalanceId, UserId};

/// One row per user with the remaining days for every leave type.
///
/// Counters are only mutated by approvals (debit) and by cancelling an
/// approved request (credit).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct LeaveBalance {
    pub id: LeaveBalanceId,
    pub user_id: UserId,
    pub annual: i32,
    pub sick: i32,
    pub maternity: i32,
    pub paternity: i32,
    pub bereavement: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeaveBalance {
    /// Remaining days for `leave_type`.
    pub fn available(&self, leave_type: LeaveType) -> i32 {
        match leave_type {
            LeaveType::Annual => self.annual,
            LeaveType::Sick => self.sick,
            LeaveType::Maternity => self.maternity,
            LeaveType::Paternity => self.paternity,
            LeaveType::Bereavement => self.bereavement,
        }
    }

    /// Builds a fresh row for `user_id` seeded from `allotments`.
    pub fn with_allotments(user_id: UserId, allotments: &LeaveAllotments) -> Self {
        let now = Utc::now();
        Self {
            id: LeaveBalanceId::new(),
            user_id,
            annual: allotments.annual,
            sick: allotments.sick,
            maternity: allotments.maternity,
            paternity: allotments.paternity,
            bereavement: allotments.bereavement,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Starting days granted to every new balance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveAllotments {
    pub annual: i32,
    pub sick: i32,
    pub maternity: i32,
    pub paternity: i32,
    pub bereavement: i32,
}

impl Default for LeaveAllotments {
    fn default() -> Self {
        Self {
            annual: 20,
            sick: 10,
            maternity: 90,
            paternity: 10,
            bereavement: 5,
        }
    }
}
