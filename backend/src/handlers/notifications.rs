use axum::{
    extract::{Extension, State},
    Json,
};

use crate::{
    error::AppError,
    models::{notification::Notification, user::AuthUser},
    state::AppState,
};

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let feed = state.ledger.recent_notifications(user.user_id).await?;
    Ok(Json(feed))
}
