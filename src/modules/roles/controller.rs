use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use gatehouse_core::AppError;
use gatehouse_core::errors::ErrorResponse;
use gatehouse_models::roles::{CreateRoleDto, PermissionDto, Role};
use tracing::instrument;

use super::service::RoleService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List all roles with their permissions
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    responses(
        (status = 200, description = "All roles", body = Vec<Role>),
        (status = 403, description = "Requires role:view or system:config", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
#[instrument(skip(state))]
pub async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<Role>>, AppError> {
    let roles = RoleService::list_roles(state.roles.as_ref()).await?;
    Ok(Json(roles))
}

/// Get a role by id
#[utoipa::path(
    get,
    path = "/api/v1/roles/{id}",
    params(("id" = u64, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role found", body = Role),
        (status = 403, description = "Requires role:view or system:config", body = ErrorResponse),
        (status = 404, description = "Role not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
#[instrument(skip(state))]
pub async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Role>, AppError> {
    let role = RoleService::get_role(state.roles.as_ref(), id).await?;
    Ok(Json(role))
}

/// Create a role
#[utoipa::path(
    post,
    path = "/api/v1/roles",
    request_body = CreateRoleDto,
    responses(
        (status = 201, description = "Role created", body = Role),
        (status = 400, description = "Role code already exists", body = ErrorResponse),
        (status = 403, description = "Requires system:config", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
#[instrument(skip(state))]
pub async fn create_role(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateRoleDto>,
) -> Result<(StatusCode, Json<Role>), AppError> {
    let role = RoleService::create_role(state.roles.as_ref(), dto).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

/// Grant a permission to a role
#[utoipa::path(
    post,
    path = "/api/v1/roles/{id}/permissions",
    params(("id" = u64, Path, description = "Role ID")),
    request_body = PermissionDto,
    responses(
        (status = 200, description = "Updated role", body = Role),
        (status = 403, description = "Requires system:config", body = ErrorResponse),
        (status = 404, description = "Role not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
#[instrument(skip(state))]
pub async fn add_permission(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    ValidatedJson(dto): ValidatedJson<PermissionDto>,
) -> Result<Json<Role>, AppError> {
    let role = RoleService::add_permission(state.roles.as_ref(), id, &dto.permission).await?;
    Ok(Json(role))
}

/// Revoke a permission from a role
#[utoipa::path(
    delete,
    path = "/api/v1/roles/{id}/permissions/{permission}",
    params(
        ("id" = u64, Path, description = "Role ID"),
        ("permission" = String, Path, description = "Permission to revoke")
    ),
    responses(
        (status = 200, description = "Updated role", body = Role),
        (status = 403, description = "Requires system:config", body = ErrorResponse),
        (status = 404, description = "Role not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
#[instrument(skip(state))]
pub async fn remove_permission(
    State(state): State<AppState>,
    Path((id, permission)): Path<(u64, String)>,
) -> Result<Json<Role>, AppError> {
    let role = RoleService::remove_permission(state.roles.as_ref(), id, &permission).await?;
    Ok(Json(role))
}
