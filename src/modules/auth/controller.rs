use axum::{Json, extract::State, http::StatusCode};
use gatehouse_core::AppError;
use gatehouse_core::errors::ErrorResponse;
use gatehouse_models::auth::{
    ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, RefreshTokenRequest,
    RegisterRequest, TokenResponse,
};
use gatehouse_models::users::UserResponse;
use tracing::instrument;

use super::service::AuthService;
use crate::middleware::auth::Identity;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Username or email already taken", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = AuthService::register(state.users.as_ref(), state.roles.as_ref(), dto).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Log in and receive an access/refresh token pair
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account disabled", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AuthService::login(state.users.as_ref(), &state.tokens, dto).await?;
    Ok(Json(response))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New access token", body = TokenResponse),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorResponse),
        (status = 403, description = "Account disabled", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let response = AuthService::refresh(state.users.as_ref(), &state.tokens, dto).await?;
    Ok(Json(response))
}

/// Get the authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/auth/user",
    responses(
        (status = 200, description = "Current user with role", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(state))]
pub async fn current_user(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<UserResponse>, AppError> {
    let user = AuthService::current_user(state.users.as_ref(), identity.user_id).await?;
    Ok(Json(user.into()))
}

/// Change the authenticated user's password
#[utoipa::path(
    post,
    path = "/api/v1/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Old password is incorrect", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn change_password(
    State(state): State<AppState>,
    identity: Identity,
    ValidatedJson(dto): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::change_password(state.users.as_ref(), identity.user_id, dto).await?;
    Ok(Json(MessageResponse {
        message: "password changed".to_string(),
    }))
}
