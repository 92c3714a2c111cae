use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::{
    models::user::{AuthUser, UserRole},
    repositories::user as user_repo,
    state::AppState,
    utils::jwt::{verify_access_token, Claims},
};

pub async fn auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let (claims, user) = authenticate_request(request.headers(), &state).await?;
    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// Auth + require manager or admin role for review routes
pub async fn auth_manager(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let (claims, user) = authenticate_request(request.headers(), &state).await?;
    if !user.role.can_review_leave() {
        return Err(StatusCode::FORBIDDEN);
    }
    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// Auth + require admin role for admin-only routes
pub async fn auth_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let (claims, user) = authenticate_request(request.headers(), &state).await?;
    if user.role != UserRole::Admin {
        return Err(StatusCode::FORBIDDEN);
    }
    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn parse_bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        let token = rest.trim();
        (!token.is_empty()).then_some(token)
    } else {
        None
    }
}

/// Role and team are re-read from the database so that changes apply
/// without waiting for the token to expire.
async fn authenticate_request(
    headers: &axum::http::HeaderMap,
    state: &AppState,
) -> Result<(Claims, AuthUser), StatusCode> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer_token)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = verify_access_token(token, &state.config.jwt_secret).map_err(|err| {
        tracing::debug!(error = %err, "rejected access token");
        StatusCode::UNAUTHORIZED
    })?;

    let user = user_repo::find_by_id(&state.pool, claims.sub)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "failed to load authenticated user");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    Ok((claims, AuthUser::from(&user)))
}
