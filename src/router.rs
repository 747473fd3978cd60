use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::{metrics_middleware, metrics_router};
use crate::middleware::auth::require_auth;
use crate::middleware::rate_limit::rate_limit_middleware;
use crate::modules::auth::router::init_auth_router;
use crate::modules::roles::router::init_roles_router;
use crate::modules::users::router::{init_admin_users_router, init_users_router};
use crate::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};

/// Builds the full application.
///
/// Everything under `/api` is rate limited first. Protected groups then
/// authenticate, and each route applies its own policy last.
pub fn init_router(state: AppState) -> Router {
    let v1 = Router::new()
        .nest("/auth", init_auth_router(&state))
        .nest(
            "/users",
            init_users_router(&state)
                .route_layer(from_fn_with_state(state.clone(), require_auth)),
        )
        .nest(
            "/admin",
            init_admin_users_router(&state)
                .route_layer(from_fn_with_state(state.clone(), require_auth)),
        )
        .nest(
            "/roles",
            init_roles_router(&state)
                .route_layer(from_fn_with_state(state.clone(), require_auth)),
        );

    let api = Router::new()
        .nest("/v1", v1)
        .layer(from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ));

    let mut app = Router::new()
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route("/health", get(|| async { "ok" }))
        .nest("/api", api)
        .with_state(state.clone());

    if let Some(handle) = state.metrics.clone() {
        app = app.merge(metrics_router(handle));
    }

    app.layer(cors_layer(&state))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(logging_middleware))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true)
}
