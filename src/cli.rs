use anyhow::{Context, bail};
use gatehouse_core::hash_password;
use gatehouse_db::{RoleRepository, UserRepository};
use gatehouse_models::users::{NewUser, User, UserStatus};
use tracing::info;

/// Creates an active account holding `role_code` (normally `admin`).
///
/// Seeds the predefined roles first so this works against a fresh database.
pub async fn create_admin<S>(
    store: &S,
    username: &str,
    email: &str,
    password: &str,
    role_code: &str,
) -> anyhow::Result<User>
where
    S: UserRepository + RoleRepository,
{
    if password.len() < 6 {
        bail!("password must be at least 6 characters");
    }

    store
        .ensure_predefined_roles()
        .await
        .context("Failed to seed predefined roles")?;

    let Some(role) = store
        .find_role_by_code(role_code)
        .await
        .context("Failed to look up role")?
    else {
        bail!("role '{role_code}' does not exist");
    };

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.message()))?;

    let user = store
        .create_user(NewUser {
            username: username.to_string(),
            password_hash,
            email: email.to_string(),
            nickname: username.to_string(),
            role_id: Some(role.id),
            status: UserStatus::Active,
        })
        .await
        .context("Failed to create user")?;

    info!(user_id = user.id, role = %role.code, "Administrator account created");
    Ok(user)
}
