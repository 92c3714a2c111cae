use axum::{
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{handlers, middleware as auth_middleware, state::AppState};

/// Full application router with CORS and request tracing.
pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.frontend_url);

    // Public routes (no auth)
    let public_routes = Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        .route("/api/auth/login", post(handlers::auth::login));

    // User-protected routes (auth required)
    let user_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/leave/balance", get(handlers::leave::get_balance))
        .route("/api/leave/request", post(handlers::leave::submit_request))
        .route("/api/leave/history", get(handlers::leave::get_history))
        .route(
            "/api/leave/{id}",
            axum::routing::delete(handlers::leave::cancel_request),
        )
        .route(
            "/api/notifications",
            get(handlers::notifications::list_notifications),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::auth,
        ));

    // Reviewer routes (auth + manager or admin role)
    let manager_routes = Router::new()
        .route("/api/leave/pending", get(handlers::leave::get_pending))
        .route(
            "/api/leave/{id}/approve",
            put(handlers::leave::approve_request),
        )
        .route("/api/leave/{id}/reject", put(handlers::leave::reject_request))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::auth_manager,
        ));

    // Admin-protected routes (auth + admin role)
    let admin_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::auth_admin,
        ));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(manager_routes)
        .merge(admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let origin = match HeaderValue::from_str(frontend_url) {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            tracing::warn!(frontend_url, "invalid FRONTEND_URL, allowing any origin");
            AllowOrigin::any()
        }
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(24 * 60 * 60))
}
