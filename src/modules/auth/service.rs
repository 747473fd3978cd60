use anyhow::anyhow;
use chrono::Utc;
use gatehouse_auth::{TokenCodec, TokenKind};
use gatehouse_core::{AppError, hash_password, verify_password};
use gatehouse_db::{RoleRepository, UserRepository};
use gatehouse_models::auth::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RefreshTokenRequest, RegisterRequest,
    TokenResponse,
};
use gatehouse_models::roles::RoleTemplate;
use gatehouse_models::users::{NewUser, User, UserChanges, UserStatus};
use tracing::{info, instrument, warn};

use crate::metrics::{track_login, track_token_issued, track_user_created};

pub const TOKEN_TYPE: &str = "Bearer";

pub struct AuthService;

impl AuthService {
    /// Creates an active account holding the default `user` role.
    #[instrument(skip(users, roles, dto), fields(username = %dto.username))]
    pub async fn register(
        users: &dyn UserRepository,
        roles: &dyn RoleRepository,
        dto: RegisterRequest,
    ) -> Result<User, AppError> {
        let default_role = roles
            .find_role_by_code(RoleTemplate::USER.code)
            .await
            .map_err(|e| e.into_app_error("role"))?;
        if default_role.is_none() {
            warn!("Default role missing, registering user without a role");
        }

        let new_user = NewUser {
            username: dto.username,
            password_hash: hash_password(&dto.password)?,
            email: dto.email,
            nickname: dto.nickname,
            role_id: default_role.map(|role| role.id),
            status: UserStatus::Active,
        };

        let user = users
            .create_user(new_user)
            .await
            .map_err(|e| e.into_app_error("user"))?;

        track_user_created(user.role_code().unwrap_or("none"));
        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    #[instrument(skip(users, tokens, dto), fields(username = %dto.username))]
    pub async fn login(
        users: &dyn UserRepository,
        tokens: &TokenCodec,
        dto: LoginRequest,
    ) -> Result<LoginResponse, AppError> {
        let user = users
            .find_user_by_username(&dto.username)
            .await
            .map_err(|e| e.into_app_error("user"))?;

        // same message for unknown user and bad password
        let Some(user) = user else {
            track_login("failure");
            return Err(AppError::unauthorized("invalid username or password"));
        };
        if !verify_password(&dto.password, &user.password_hash)? {
            track_login("failure");
            warn!(user_id = user.id, "Login with wrong password");
            return Err(AppError::unauthorized("invalid username or password"));
        }
        if !user.status.is_active() {
            track_login("failure");
            warn!(user_id = user.id, status = user.status.as_i16(), "Login for disabled account");
            return Err(AppError::forbidden("account is disabled"));
        }

        let role = user.role_code().unwrap_or_default().to_string();
        let access_token = tokens
            .issue_access_token(user.id, &user.username, &role)
            .map_err(|e| AppError::internal_error(e.to_string()))?;
        let refresh_token = tokens
            .issue_refresh_token(user.id, &user.username, &role)
            .map_err(|e| AppError::internal_error(e.to_string()))?;
        track_token_issued("access");
        track_token_issued("refresh");

        let user = users
            .update_user(
                user.id,
                UserChanges {
                    last_login: Some(Utc::now()),
                    ..UserChanges::default()
                },
            )
            .await
            .map_err(|e| e.into_app_error("user"))?;

        track_login("success");
        info!(user_id = user.id, "User logged in");

        Ok(LoginResponse {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: tokens.access_ttl(),
            user: user.into(),
        })
    }

    /// Trades a refresh token for a new access token.
    #[instrument(skip_all)]
    pub async fn refresh(
        users: &dyn UserRepository,
        tokens: &TokenCodec,
        dto: RefreshTokenRequest,
    ) -> Result<TokenResponse, AppError> {
        let claims = tokens
            .verify(&dto.refresh_token, TokenKind::Refresh)
            .map_err(|e| {
                warn!(reason = %e, "Rejected refresh token");
                AppError::unauthorized(format!("invalid token: {e}"))
            })?;

        let user = users
            .find_user_by_id(claims.user_id)
            .await
            .map_err(|e| e.into_app_error("user"))?
            .ok_or_else(|| AppError::unauthorized("user not found"))?;
        if !user.status.is_active() {
            return Err(AppError::forbidden("account is disabled"));
        }

        let role = user.role_code().unwrap_or_default();
        let access_token = tokens
            .issue_access_token(user.id, &user.username, role)
            .map_err(|e| AppError::internal_error(e.to_string()))?;
        track_token_issued("access");

        Ok(TokenResponse {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: tokens.access_ttl(),
        })
    }

    #[instrument(skip(users))]
    pub async fn current_user(users: &dyn UserRepository, user_id: u64) -> Result<User, AppError> {
        users
            .find_user_by_id(user_id)
            .await
            .map_err(|e| e.into_app_error("user"))?
            .ok_or_else(|| AppError::unauthorized("user not found"))
    }

    #[instrument(skip(users, dto))]
    pub async fn change_password(
        users: &dyn UserRepository,
        user_id: u64,
        dto: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        let user = Self::current_user(users, user_id).await?;

        if !verify_password(&dto.old_password, &user.password_hash)? {
            return Err(AppError::bad_request(anyhow!("old password is incorrect")));
        }
        if dto.old_password == dto.new_password {
            return Err(AppError::bad_request(anyhow!(
                "new password must differ from the old one"
            )));
        }

        let changes = UserChanges {
            password_hash: Some(hash_password(&dto.new_password)?),
            ..UserChanges::default()
        };
        users
            .update_user(user.id, changes)
            .await
            .map_err(|e| e.into_app_error("user"))?;

        info!(user_id, "Password changed");
        Ok(())
    }
}
