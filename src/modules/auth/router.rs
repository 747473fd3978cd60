use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use super::controller::{change_password, current_user, login, refresh, register};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn init_auth_router(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/user", get(current_user))
        .route("/change-password", post(change_password))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .merge(protected)
}
