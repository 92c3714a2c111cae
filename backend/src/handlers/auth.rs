use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        leave_balance::LeaveBalance,
        user::{AuthUser, LoginRequest, LoginResponse, RegisterRequest, User, UserResponse},
    },
    repositories::{
        transaction::{begin_transaction, commit_transaction},
        user as user_repo, LeaveBalanceRepository,
    },
    state::AppState,
    utils::{
        jwt::create_access_token,
        password::{hash_password, verify_password},
    },
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;

    let user = user_repo::find_by_email(&state.pool, payload.email.trim())
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "login rejected: password mismatch");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = create_access_token(
        &user,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user logged in");
    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(user),
    }))
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout(Extension(user): Extension<AuthUser>) -> Json<Value> {
    tracing::info!(user_id = %user.user_id, "user logged out");
    Json(json!({ "message": "Logged out successfully" }))
}

#[derive(Debug, serde::Serialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
    pub balance: LeaveBalance,
}

/// Creates the account and its default balance in one transaction.
pub async fn register(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    payload.validate()?;
    let email = payload.email.trim().to_lowercase();

    if user_repo::find_team(&state.pool, payload.team_id)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest("Team does not exist".to_string()));
    }
    if user_repo::email_exists(&state.pool, &email).await? {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = User::new(
        email,
        password_hash,
        payload.name.trim().to_string(),
        payload.role,
        payload.team_id,
    );

    let mut tx = begin_transaction(&state.pool).await?;
    let user = user_repo::insert_user(&mut *tx, &user).await?;
    let balance = LeaveBalanceRepository::insert_default(
        &mut *tx,
        user.id,
        state.ledger.allotments(),
    )
    .await?
    .ok_or_else(|| AppError::Conflict("Leave balance already exists".to_string()))?;
    commit_transaction(tx).await?;

    tracing::info!(
        user_id = %user.id,
        created_by = %admin.user_id,
        role = user.role.as_str(),
        "user registered"
    );
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: UserResponse::from(user),
            balance,
        }),
    ))
}
