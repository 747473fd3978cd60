use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use gatehouse_core::permissions::{ROLE_VIEW, SYSTEM_CONFIG};

use super::controller::{add_permission, create_role, get_role, list_roles, remove_permission};
use crate::middleware::policy::{Policy, PolicyGuard, enforce_policy};
use crate::state::AppState;

pub fn init_roles_router(state: &AppState) -> Router<AppState> {
    let viewers = || PolicyGuard::new(state, Policy::any_of([ROLE_VIEW, SYSTEM_CONFIG]));
    let admins = || PolicyGuard::new(state, Policy::permission(SYSTEM_CONFIG));

    Router::new()
        .route(
            "/",
            get(list_roles).route_layer(from_fn_with_state(viewers(), enforce_policy)),
        )
        .route(
            "/",
            post(create_role).route_layer(from_fn_with_state(admins(), enforce_policy)),
        )
        .route(
            "/{id}",
            get(get_role).route_layer(from_fn_with_state(viewers(), enforce_policy)),
        )
        .route(
            "/{id}/permissions",
            post(add_permission).route_layer(from_fn_with_state(admins(), enforce_policy)),
        )
        .route(
            "/{id}/permissions/{permission}",
            delete(remove_permission).route_layer(from_fn_with_state(admins(), enforce_policy)),
        )
}
