use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use gatehouse_core::AppError;
use gatehouse_core::errors::ErrorResponse;
use gatehouse_models::auth::MessageResponse;
use gatehouse_models::users::{
    CreateUserDto, PaginatedUsersResponse, UpdateUserDto, UserFilterParams, UserResponse,
};
use tracing::instrument;

use super::service::UserService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List users, paginated and optionally filtered
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(UserFilterParams),
    responses(
        (status = 200, description = "Page of users", body = PaginatedUsersResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Requires permission user:list", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(filters): Query<UserFilterParams>,
) -> Result<Json<PaginatedUsersResponse>, AppError> {
    let page = UserService::list_users(state.users.as_ref(), filters).await?;
    Ok(Json(page))
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 403, description = "Requires user:list or user:read", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<UserResponse>, AppError> {
    let user = UserService::get_user(state.users.as_ref(), id).await?;
    Ok(Json(user.into()))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Duplicate username or email, or unknown role", body = ErrorResponse),
        (status = 403, description = "Requires role admin or permission user:create", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, dto))]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = UserService::create_user(state.users.as_ref(), state.roles.as_ref(), dto).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Update a user's nickname, email or role
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = u64, Path, description = "User ID")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Duplicate email or unknown role", body = ErrorResponse),
        (status = 403, description = "Requires role admin and permission user:update", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<UserResponse>, AppError> {
    let user = UserService::update_user(state.users.as_ref(), id, dto).await?;
    Ok(Json(user.into()))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 403, description = "Requires user:delete and user:manage", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<MessageResponse>, AppError> {
    UserService::delete_user(state.users.as_ref(), id).await?;
    Ok(Json(MessageResponse {
        message: "user deleted".to_string(),
    }))
}

/// Delete a user (admin role only)
#[utoipa::path(
    delete,
    path = "/api/v1/admin/users/{id}",
    params(("id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 403, description = "Requires role admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn admin_delete_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<MessageResponse>, AppError> {
    UserService::delete_user(state.users.as_ref(), id).await?;
    Ok(Json(MessageResponse {
        message: "user deleted".to_string(),
    }))
}
