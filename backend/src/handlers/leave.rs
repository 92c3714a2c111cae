use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    models::{
        leave_balance::LeaveBalance,
        leave_request::{
            LeaveHistoryFilter, LeaveRequest, LeaveType, NewLeaveRequest, PendingLeaveRequest,
        },
        request::RequestStatus,
        user::AuthUser,
    },
    state::AppState,
    types::LeaveRequestId,
    utils::time::parse_date_value,
};

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub status: Option<String>,
    pub leave_type: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl HistoryQuery {
    fn into_filter(self) -> Result<LeaveHistoryFilter, AppError> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<RequestStatus>)
            .transpose()
            .map_err(AppError::BadRequest)?;
        let leave_type = self
            .leave_type
            .as_deref()
            .map(str::parse::<LeaveType>)
            .transpose()
            .map_err(AppError::BadRequest)?;
        let from = parse_optional_date(self.from.as_deref(), "from")?;
        let to = parse_optional_date(self.to.as_deref(), "to")?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(AppError::BadRequest("`from` must be on or before `to`".into()));
            }
        }
        Ok(LeaveHistoryFilter {
            status,
            leave_type,
            from,
            to,
        })
    }
}

fn parse_optional_date(
    raw: Option<&str>,
    field: &str,
) -> Result<Option<chrono::NaiveDate>, AppError> {
    raw.map(|value| {
        parse_date_value(value)
            .ok_or_else(|| AppError::BadRequest(format!("`{field}` must be a valid date")))
    })
    .transpose()
}

#[derive(Debug, Deserialize)]
pub struct RejectPayload {
    #[serde(default)]
    pub reason: Option<String>,
}

pub async fn get_balance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<LeaveBalance>, AppError> {
    let balance = state.ledger.get_or_create_balance(user.user_id).await?;
    Ok(Json(balance))
}

pub async fn submit_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<NewLeaveRequest>,
) -> Result<(StatusCode, Json<LeaveRequest>), AppError> {
    let request = state.ledger.submit_request(user.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn get_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<LeaveRequest>>, AppError> {
    let filter = query.into_filter()?;
    let history = state.ledger.list_history(user.user_id, filter).await?;
    Ok(Json(history))
}

/// Pending requests of the reviewer's own team.
pub async fn get_pending(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<PendingLeaveRequest>>, AppError> {
    let pending = state.ledger.list_pending_for_team(user.team_id).await?;
    Ok(Json(pending))
}

pub async fn approve_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(request_id): Path<LeaveRequestId>,
) -> Result<Json<LeaveRequest>, AppError> {
    let request = state
        .ledger
        .approve_request(request_id, user.user_id)
        .await?;
    Ok(Json(request))
}

pub async fn reject_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(request_id): Path<LeaveRequestId>,
    Json(payload): Json<RejectPayload>,
) -> Result<Json<LeaveRequest>, AppError> {
    let reason = payload.reason.unwrap_or_default();
    let request = state
        .ledger
        .reject_request(request_id, user.user_id, &reason)
        .await?;
    Ok(Json(request))
}

pub async fn cancel_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(request_id): Path<LeaveRequestId>,
) -> Result<Json<LeaveRequest>, AppError> {
    let request = state.ledger.cancel_request(request_id, user.user_id).await?;
    Ok(Json(request))
}
