use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use gatehouse_core::permissions::{USER_CREATE, USER_DELETE, USER_LIST, USER_MANAGE, USER_READ, USER_UPDATE};

use super::controller::{
    admin_delete_user, create_user, delete_user, get_user, list_users, update_user,
};
use crate::middleware::policy::{Policy, PolicyGuard, enforce_policy};
use crate::state::AppState;

/// User management. Every route sits behind its own policy; authentication
/// is applied by the caller.
pub fn init_users_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_users).route_layer(from_fn_with_state(
                PolicyGuard::new(state, Policy::permission(USER_LIST)),
                enforce_policy,
            )),
        )
        .route(
            "/",
            post(create_user).route_layer(from_fn_with_state(
                PolicyGuard::new(state, Policy::role_or_permission("admin", USER_CREATE)),
                enforce_policy,
            )),
        )
        .route(
            "/{id}",
            get(get_user).route_layer(from_fn_with_state(
                PolicyGuard::new(state, Policy::any_of([USER_LIST, USER_READ])),
                enforce_policy,
            )),
        )
        .route(
            "/{id}",
            put(update_user).route_layer(from_fn_with_state(
                PolicyGuard::new(state, Policy::role_and_permission("admin", USER_UPDATE)),
                enforce_policy,
            )),
        )
        .route(
            "/{id}",
            delete(delete_user).route_layer(from_fn_with_state(
                PolicyGuard::new(state, Policy::all_of([USER_DELETE, USER_MANAGE])),
                enforce_policy,
            )),
        )
}

/// Admin-only shortcuts, mounted under `/admin`.
pub fn init_admin_users_router(state: &AppState) -> Router<AppState> {
    Router::new().route(
        "/users/{id}",
        delete(admin_delete_user).route_layer(from_fn_with_state(
            PolicyGuard::new(state, Policy::role("admin")),
            enforce_policy,
        )),
    )
}
