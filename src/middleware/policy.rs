//! Role and permission policies.
//!
//! A [`Policy`] is evaluated against the caller's *current* role, looked up
//! from the store on every request. Nothing about roles or permissions is
//! trusted from the token, so role edits apply to the next request of every
//! holder.
//!
//! Every failure path denies. In particular a missing identity, a missing
//! user row or a user without a role never fall through to "allow".
//!
//! `AnyOfPermissions` and `AllOfPermissions` handle lookup errors
//! differently: any-of skips a failed check and keeps going, all-of turns
//! the first failure into [`DenyReason::Internal`].
//!
//! # Example
//!
//! ```ignore
//! use axum::routing::get;
//! use axum::middleware::from_fn_with_state;
//! use gatehouse::middleware::policy::{Policy, PolicyGuard, enforce_policy};
//!
//! let guard = PolicyGuard::new(&state, Policy::permission("user:list"));
//! let route = get(list_users).route_layer(from_fn_with_state(guard, enforce_policy));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use gatehouse_core::AppError;
use gatehouse_db::{StoreError, UserRepository};
use gatehouse_models::users::User;
use thiserror::Error;
use tracing::{error, warn};

use crate::metrics::track_authorization;
use crate::middleware::auth::Identity;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    Role(String),
    Permission(String),
    RoleAndPermission { role: String, permission: String },
    RoleOrPermission { role: String, permission: String },
    AnyOfPermissions(Vec<String>),
    AllOfPermissions(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("unauthenticated user")]
    Unauthenticated,

    #[error("user not found")]
    UserNotFound,

    #[error("user has no role assigned")]
    NoRole,

    #[error("access control require role: {0}")]
    MissingRole(String),

    #[error("access control require permission: {0}")]
    MissingPermission(String),

    #[error("access control require role: {role} or permission: {permission}")]
    MissingRoleOrPermission { role: String, permission: String },

    #[error("permission control requires one of the following authorizations: {}", .0.join(", "))]
    MissingAnyPermission(Vec<String>),

    /// Store failure; the detail is logged, not sent to the client.
    #[error("permission check fail")]
    Internal(String),
}

impl DenyReason {
    pub fn status(&self) -> StatusCode {
        match self {
            DenyReason::Unauthenticated | DenyReason::UserNotFound => StatusCode::UNAUTHORIZED,
            DenyReason::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::FORBIDDEN,
        }
    }

    /// Rejection envelope for this reason. `Internal` detail stays out of
    /// the message.
    pub fn into_app_error(self) -> AppError {
        match self.status() {
            StatusCode::UNAUTHORIZED => AppError::unauthorized(self.to_string()),
            StatusCode::INTERNAL_SERVER_ERROR => AppError::internal_error(self.to_string()),
            _ => AppError::forbidden(self.to_string()),
        }
    }
}

impl Policy {
    pub fn role(role: impl Into<String>) -> Self {
        Policy::Role(role.into())
    }

    pub fn permission(permission: impl Into<String>) -> Self {
        Policy::Permission(permission.into())
    }

    pub fn role_and_permission(role: impl Into<String>, permission: impl Into<String>) -> Self {
        Policy::RoleAndPermission {
            role: role.into(),
            permission: permission.into(),
        }
    }

    pub fn role_or_permission(role: impl Into<String>, permission: impl Into<String>) -> Self {
        Policy::RoleOrPermission {
            role: role.into(),
            permission: permission.into(),
        }
    }

    pub fn any_of<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Policy::AnyOfPermissions(permissions.into_iter().map(Into::into).collect())
    }

    pub fn all_of<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Policy::AllOfPermissions(permissions.into_iter().map(Into::into).collect())
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Policy::Role(_) => "role",
            Policy::Permission(_) => "permission",
            Policy::RoleAndPermission { .. } => "role_and_permission",
            Policy::RoleOrPermission { .. } => "role_or_permission",
            Policy::AnyOfPermissions(_) => "any_of_permissions",
            Policy::AllOfPermissions(_) => "all_of_permissions",
        }
    }

    /// Decides whether `identity` may proceed.
    pub async fn evaluate(
        &self,
        users: &dyn UserRepository,
        identity: Option<&Identity>,
    ) -> Decision {
        let Some(identity) = identity else {
            return Decision::Deny(DenyReason::Unauthenticated);
        };

        let user = match users.find_user_by_id(identity.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return Decision::Deny(DenyReason::UserNotFound),
            Err(e) => return Decision::Deny(DenyReason::Internal(e.to_string())),
        };
        let Some(role_code) = user.role_code() else {
            return Decision::Deny(DenyReason::NoRole);
        };

        match self {
            Policy::Role(role) => {
                if role_code == role {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::MissingRole(role.clone()))
                }
            }
            Policy::Permission(permission) => {
                match check(users, &user, permission).await {
                    Ok(true) => Decision::Allow,
                    Ok(false) => Decision::Deny(DenyReason::MissingPermission(permission.clone())),
                    Err(reason) => Decision::Deny(reason),
                }
            }
            Policy::RoleAndPermission { role, permission } => {
                if role_code != role {
                    return Decision::Deny(DenyReason::MissingRole(role.clone()));
                }
                match check(users, &user, permission).await {
                    Ok(true) => Decision::Allow,
                    Ok(false) => Decision::Deny(DenyReason::MissingPermission(permission.clone())),
                    Err(reason) => Decision::Deny(reason),
                }
            }
            Policy::RoleOrPermission { role, permission } => {
                if role_code == role {
                    return Decision::Allow;
                }
                match check(users, &user, permission).await {
                    Ok(true) => Decision::Allow,
                    Ok(false) => Decision::Deny(DenyReason::MissingRoleOrPermission {
                        role: role.clone(),
                        permission: permission.clone(),
                    }),
                    Err(reason) => Decision::Deny(reason),
                }
            }
            Policy::AnyOfPermissions(permissions) => {
                for permission in permissions {
                    match check(users, &user, permission).await {
                        Ok(true) => return Decision::Allow,
                        Ok(false) => {}
                        // a failed check is skipped, not fatal
                        Err(reason) => {
                            warn!(user_id = user.id, %permission, %reason, "Skipping failed permission check");
                        }
                    }
                }
                Decision::Deny(DenyReason::MissingAnyPermission(permissions.clone()))
            }
            Policy::AllOfPermissions(permissions) => {
                for permission in permissions {
                    match check(users, &user, permission).await {
                        Ok(true) => {}
                        Ok(false) => {
                            return Decision::Deny(DenyReason::MissingPermission(
                                permission.clone(),
                            ));
                        }
                        Err(reason) => return Decision::Deny(reason),
                    }
                }
                Decision::Allow
            }
        }
    }
}

/// Live single-permission lookup for an already resolved user.
async fn check(
    users: &dyn UserRepository,
    user: &User,
    permission: &str,
) -> Result<bool, DenyReason> {
    match users.has_permission(user.id, permission).await {
        Ok(granted) => Ok(granted),
        Err(StoreError::NotFound) => Err(DenyReason::UserNotFound),
        Err(e) => Err(DenyReason::Internal(e.to_string())),
    }
}

/// State for [`enforce_policy`]: one policy, built once per route.
#[derive(Clone)]
pub struct PolicyGuard {
    users: Arc<dyn UserRepository>,
    policy: Arc<Policy>,
}

impl PolicyGuard {
    pub fn new(state: &AppState, policy: Policy) -> Self {
        Self {
            users: Arc::clone(&state.users),
            policy: Arc::new(policy),
        }
    }
}

/// Route middleware applying a [`PolicyGuard`]. Must run after
/// [`require_auth`](crate::middleware::auth::require_auth).
pub async fn enforce_policy(
    State(guard): State<PolicyGuard>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = req.extensions().get::<Identity>().cloned();
    let decision = guard
        .policy
        .evaluate(guard.users.as_ref(), identity.as_ref())
        .await;

    match decision {
        Decision::Allow => {
            track_authorization(guard.policy.kind(), "allow");
            Ok(next.run(req).await)
        }
        Decision::Deny(reason) => {
            track_authorization(guard.policy.kind(), "deny");
            let user_id = identity.map(|i| i.user_id);
            if matches!(reason, DenyReason::Internal(_)) {
                error!(?user_id, policy = guard.policy.kind(), ?reason, "Authorization lookup failed");
            } else {
                warn!(?user_id, policy = guard.policy.kind(), %reason, "Authorization denied");
            }
            Err(reason.into_app_error())
        }
    }
}
