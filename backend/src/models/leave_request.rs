use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;
use crate::models::request::RequestStatus;
use crate::types::{LeaveRequestId, UserId};
use crate::utils::time::parse_date_value;

/// Leave category; doubles as the key of the matching balance counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveType {
    Annual,
    Sick,
    Maternity,
    Paternity,
    Bereavement,
}

impl LeaveType {
    pub const ALL: [LeaveType; 5] = [
        LeaveType::Annual,
        LeaveType::Sick,
        LeaveType::Maternity,
        LeaveType::Paternity,
        LeaveType::Bereavement,
    ];

    pub fn db_value(&self) -> &'static str {
        self.balance_column()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveType::Annual => "ANNUAL",
            LeaveType::Sick => "SICK",
            LeaveType::Maternity => "MATERNITY",
            LeaveType::Paternity => "PATERNITY",
            LeaveType::Bereavement => "BEREAVEMENT",
        }
    }

    /// Column of `leave_balances` holding the remaining days of this type.
    pub fn balance_column(&self) -> &'static str {
        match self {
            LeaveType::Annual => "annual",
            LeaveType::Sick => "sick",
            LeaveType::Maternity => "maternity",
            LeaveType::Paternity => "paternity",
            LeaveType::Bereavement => "bereavement",
        }
    }
}

impl fmt::Display for LeaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaveType {
    type Err = String;

    /// Exact, case-sensitive match on the API name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeaveType::ALL
            .into_iter()
            .find(|leave_type| leave_type.as_str() == s)
            .ok_or_else(|| format!("unknown leave type: {}", s))
    }
}

impl TryFrom<String> for LeaveType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LeaveType::ALL
            .into_iter()
            .find(|leave_type| leave_type.db_value() == value)
            .ok_or_else(|| format!("unexpected stored leave type: {}", value))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct LeaveRequest {
    pub id: LeaveRequestId,
    pub user_id: UserId,
    #[sqlx(try_from = "String")]
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub working_days: i32,
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
    pub approved_by: Option<UserId>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a cancellation does to the owner's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationEffect {
    /// Pending requests never debited anything.
    StatusOnly,
    /// Approved requests give their days back.
    Restore { leave_type: LeaveType, days: i32 },
}

impl LeaveRequest {
    /// Fails with `InvalidState` unless the request may move to `next`.
    pub fn ensure_transition(&self, next: RequestStatus) -> Result<(), LedgerError> {
        if self.status.can_transition_to(next) {
            return Ok(());
        }
        let message = match next {
            RequestStatus::Approved | RequestStatus::Rejected => {
                format!("Leave request is not pending (current status: {})", self.status)
            }
            _ => format!(
                "Leave request cannot be {} from status {}",
                next.as_str().to_lowercase(),
                self.status
            ),
        };
        Err(LedgerError::invalid_state(message))
    }

    /// Checks ownership, start date and status for a cancellation by `caller`,
    /// in that order, and reports the balance change it implies.
    pub fn cancellation_effect(
        &self,
        caller: UserId,
        today: NaiveDate,
    ) -> Result<CancellationEffect, LedgerError> {
        if self.user_id != caller {
            return Err(LedgerError::Authorization(
                "Only the owner can cancel a leave request".to_string(),
            ));
        }
        if today >= self.start_date {
            return Err(LedgerError::invalid_state(
                "Cannot cancel leave that has already started",
            ));
        }
        self.ensure_transition(RequestStatus::Cancelled)?;
        Ok(match self.status {
            RequestStatus::Approved => CancellationEffect::Restore {
                leave_type: self.leave_type,
                days: self.working_days,
            },
            _ => CancellationEffect::StatusOnly,
        })
    }
}

/// Raw submission as received from a caller; every field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewLeaveRequest {
    pub leave_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub reason: Option<String>,
}

/// A submission that passed field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveSubmission {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

impl LeaveSubmission {
    pub fn parse(input: NewLeaveRequest) -> Result<Self, LedgerError> {
        let (Some(leave_type), Some(start_date), Some(end_date), Some(reason)) = (
            non_empty(input.leave_type),
            non_empty(input.start_date),
            non_empty(input.end_date),
            non_empty(input.reason),
        ) else {
            return Err(LedgerError::validation(
                "leave_type, start_date, end_date and reason are required",
            ));
        };

        let leave_type = leave_type
            .parse::<LeaveType>()
            .map_err(LedgerError::Validation)?;
        let start_date = parse_date(&start_date, "start_date")?;
        let end_date = parse_date(&end_date, "end_date")?;

        if start_date > end_date {
            return Err(LedgerError::validation("end_date must not be before start_date"));
        }

        Ok(Self {
            leave_type,
            start_date,
            end_date,
            reason,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, LedgerError> {
    parse_date_value(raw)
        .ok_or_else(|| LedgerError::validation(format!("{field} must be an ISO-8601 date")))
}

/// Optional filters for a user's request history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeaveHistoryFilter {
    pub status: Option<RequestStatus>,
    pub leave_type: Option<LeaveType>,
    /// Inclusive lower bound on `start_date`.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on `start_date`.
    pub to: Option<NaiveDate>,
}

/// Pending request joined with the requester, as shown to approvers.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PendingLeaveRequest {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub request: LeaveRequest,
    pub requester_name: String,
    pub requester_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn request(status: RequestStatus, owner: UserId) -> LeaveRequest {
        let now = Utc::now();
        LeaveRequest {
            id: LeaveRequestId::new(),
            user_id: owner,
            leave_type: LeaveType::Sick,
            start_date: date("2024-12-02"),
            end_date: date("2024-12-06"),
            reason: "flu".into(),
            working_days: 5,
            status,
            approved_by: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn submission(
        leave_type: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
        reason: Option<&str>,
    ) -> NewLeaveRequest {
        NewLeaveRequest {
            leave_type: leave_type.map(str::to_string),
            start_date: start.map(str::to_string),
            end_date: end.map(str::to_string),
            reason: reason.map(str::to_string),
        }
    }

    #[test]
    fn leave_type_maps_every_variant_to_its_column() {
        let columns: Vec<_> = LeaveType::ALL.iter().map(|t| t.balance_column()).collect();
        assert_eq!(
            columns,
            ["annual", "sick", "maternity", "paternity", "bereavement"]
        );
    }

    #[test]
    fn leave_type_parse_is_case_sensitive() {
        assert_eq!("PATERNITY".parse::<LeaveType>(), Ok(LeaveType::Paternity));
        assert!("paternity".parse::<LeaveType>().is_err());
        assert!("Vacation".parse::<LeaveType>().is_err());
        assert_eq!(
            LeaveType::try_from("bereavement".to_string()),
            Ok(LeaveType::Bereavement)
        );
    }

    #[test]
    fn parse_accepts_complete_submission() {
        let parsed = LeaveSubmission::parse(submission(
            Some("ANNUAL"),
            Some("2024-12-02"),
            Some("2024-12-08"),
            Some("holiday"),
        ))
        .unwrap();
        assert_eq!(parsed.leave_type, LeaveType::Annual);
        assert_eq!(parsed.start_date, date("2024-12-02"));
        assert_eq!(parsed.end_date, date("2024-12-08"));
    }

    #[test]
    fn parse_accepts_timestamp_dates() {
        let parsed = LeaveSubmission::parse(submission(
            Some("SICK"),
            Some("2024-12-02T00:00:00Z"),
            Some("2024-12-03T00:00:00+09:00"),
            Some("flu"),
        ))
        .unwrap();
        assert_eq!(parsed.start_date, date("2024-12-02"));
        assert_eq!(parsed.end_date, date("2024-12-03"));
    }

    #[test]
    fn parse_rejects_missing_or_blank_fields() {
        let cases = [
            submission(None, Some("2024-12-02"), Some("2024-12-03"), Some("x")),
            submission(Some("ANNUAL"), None, Some("2024-12-03"), Some("x")),
            submission(Some("ANNUAL"), Some("2024-12-02"), Some(""), Some("x")),
            submission(Some("ANNUAL"), Some("2024-12-02"), Some("2024-12-03"), Some("  ")),
        ];
        for case in cases {
            let err = LeaveSubmission::parse(case).unwrap_err();
            assert!(matches!(err, LedgerError::Validation(_)));
        }
    }

    #[test]
    fn parse_rejects_end_before_start_regardless_of_type() {
        for leave_type in LeaveType::ALL {
            let err = LeaveSubmission::parse(submission(
                Some(leave_type.as_str()),
                Some("2024-12-10"),
                Some("2024-12-09"),
                Some("x"),
            ))
            .unwrap_err();
            assert!(matches!(err, LedgerError::Validation(ref m) if m.contains("before")));
        }
    }

    #[test]
    fn parse_rejects_unknown_type_and_bad_dates() {
        let err = LeaveSubmission::parse(submission(
            Some("annual"),
            Some("2024-12-02"),
            Some("2024-12-03"),
            Some("x"),
        ))
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let err = LeaveSubmission::parse(submission(
            Some("ANNUAL"),
            Some("12/02/2024"),
            Some("2024-12-03"),
            Some("x"),
        ))
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(ref m) if m.contains("start_date")));
    }

    #[test]
    fn cancelling_approved_future_leave_restores_days() {
        let owner = UserId::new();
        let req = request(RequestStatus::Approved, owner);
        let effect = req.cancellation_effect(owner, date("2024-11-30")).unwrap();
        assert_eq!(
            effect,
            CancellationEffect::Restore {
                leave_type: LeaveType::Sick,
                days: 5
            }
        );
    }

    #[test]
    fn cancelling_pending_leave_changes_status_only() {
        let owner = UserId::new();
        let req = request(RequestStatus::Pending, owner);
        let effect = req.cancellation_effect(owner, date("2024-12-01")).unwrap();
        assert_eq!(effect, CancellationEffect::StatusOnly);
    }

    #[test]
    fn cancelling_requires_owner() {
        let req = request(RequestStatus::Pending, UserId::new());
        let err = req
            .cancellation_effect(UserId::new(), date("2024-11-01"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Authorization(_)));
    }

    #[test]
    fn cancelling_started_leave_fails_for_every_status() {
        let owner = UserId::new();
        for status in RequestStatus::ALL {
            let req = request(status, owner);
            for today in [date("2024-12-02"), date("2024-12-04")] {
                let err = req.cancellation_effect(owner, today).unwrap_err();
                assert!(
                    matches!(err, LedgerError::InvalidState(ref m) if m.contains("started")),
                    "{status} on {today}"
                );
            }
        }
    }

    #[test]
    fn cancelling_terminal_request_is_invalid_state() {
        let owner = UserId::new();
        for status in [RequestStatus::Rejected, RequestStatus::Cancelled] {
            let err = request(status, owner)
                .cancellation_effect(owner, date("2024-11-01"))
                .unwrap_err();
            assert!(matches!(err, LedgerError::InvalidState(_)));
        }
    }

    #[test]
    fn approving_non_pending_request_is_invalid_state() {
        let req = request(RequestStatus::Approved, UserId::new());
        let err = req.ensure_transition(RequestStatus::Approved).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState(ref m) if m.contains("not pending")));
        assert!(request(RequestStatus::Pending, UserId::new())
            .ensure_transition(RequestStatus::Rejected)
            .is_ok());
    }

    #[test]
    fn leave_request_serializes_api_enum_names() {
        let json = serde_json::to_value(request(RequestStatus::Pending, UserId::new())).unwrap();
        assert_eq!(json["leave_type"], "SICK");
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["working_days"], 5);
        assert!(json["approved_by"].is_null());
    }
}
