//! User domain models and DTOs.
//!
//! [`User`] is the stored entity, joined with its role. It carries the
//! password hash and is never serialized directly; responses go through
//! [`UserResponse`].

use gatehouse_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::roles::Role;

/// Account status. Only active accounts may log in or refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Banned,
}

impl UserStatus {
    pub fn as_i16(self) -> i16 {
        match self {
            UserStatus::Active => 1,
            UserStatus::Inactive => 0,
            UserStatus::Banned => -1,
        }
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(UserStatus::Active),
            0 => Some(UserStatus::Inactive),
            -1 => Some(UserStatus::Banned),
            _ => None,
        }
    }

    pub fn is_active(self) -> bool {
        self == UserStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub nickname: String,
    pub status: UserStatus,
    /// `None` when the user has no role or the role row is gone
    pub role: Option<Role>,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn role_code(&self) -> Option<&str> {
        self.role.as_ref().map(|r| r.code.as_str())
    }
}

/// Input for persisting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub nickname: String,
    pub role_id: Option<u64>,
    pub status: UserStatus,
}

/// Partial update applied by the store. `None` leaves a column unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub role_id: Option<u64>,
    pub status: Option<UserStatus>,
    pub password_hash: Option<String>,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub nickname: String,
    /// 1 active, 0 inactive, -1 banned
    pub status: i16,
    pub role: Option<Role>,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            nickname: user.nickname,
            status: user.status.as_i16(),
            role: user.role,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 3, max = 50))]
    #[schema(example = "jdoe")]
    pub username: String,
    #[validate(length(min = 6, max = 20))]
    pub password: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 2, max = 50))]
    pub nickname: String,
    /// Defaults to the `user` role when omitted
    pub role_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(length(min = 2, max = 50))]
    pub nickname: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub role_id: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilterParams {
    /// Matches username, nickname or email (case-insensitive substring)
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<UserResponse>,
    pub meta: PaginationMeta,
}
