//! Status feed derived from a user's recently updated leave requests.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::leave_request::LeaveRequest;
use crate::models::request::RequestStatus;
use crate::types::LeaveRequestId;

/// Look-back window of the feed.
pub const NOTIFICATION_WINDOW_DAYS: i64 = 7;
/// Maximum entries returned.
pub const NOTIFICATION_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: LeaveRequestId,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

impl From<&LeaveRequest> for Notification {
    fn from(request: &LeaveRequest) -> Self {
        let (phrase, kind) = match request.status {
            RequestStatus::Approved => ("has been approved", NotificationKind::Success),
            RequestStatus::Rejected => ("has been rejected", NotificationKind::Error),
            RequestStatus::Pending => ("is pending approval", NotificationKind::Info),
            RequestStatus::Cancelled => ("has been cancelled", NotificationKind::Warning),
        };
        Notification {
            id: request.id,
            message: format!(
                "Your {} leave request {}",
                request.leave_type.as_str().to_lowercase(),
                phrase
            ),
            kind,
            timestamp: request.updated_at,
            read: false,
        }
    }
}
