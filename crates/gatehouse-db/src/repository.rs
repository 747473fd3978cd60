//! Storage traits consumed by services and authorization policies.

use async_trait::async_trait;
use gatehouse_core::PermissionSet;
use gatehouse_models::roles::{NewRole, Role, RoleTemplate};
use gatehouse_models::users::{NewUser, User, UserChanges};

use crate::error::StoreError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Loads a user joined with its current role.
    async fn find_user_by_id(&self, id: u64) -> Result<Option<User>, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Applies the non-`None` fields of `changes`.
    async fn update_user(&self, id: u64, changes: UserChanges) -> Result<User, StoreError>;

    /// Returns `false` when no such user existed.
    async fn delete_user(&self, id: u64) -> Result<bool, StoreError>;

    /// Returns one page of users ordered by id, plus the total match count.
    async fn list_users(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), StoreError>;

    /// Live check of a single permission against the user's current role.
    ///
    /// A missing user is `NotFound`; a user without a role has no permissions.
    async fn has_permission(&self, user_id: u64, permission: &str) -> Result<bool, StoreError> {
        let user = self
            .find_user_by_id(user_id)
            .await?
            .ok_or(StoreError::NotFound)?;
        Ok(user.role.is_some_and(|role| role.has_permission(permission)))
    }
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError>;

    async fn find_role_by_id(&self, id: u64) -> Result<Option<Role>, StoreError>;

    async fn find_role_by_code(&self, code: &str) -> Result<Option<Role>, StoreError>;

    async fn create_role(&self, role: NewRole) -> Result<Role, StoreError>;

    /// Adds a permission to a role. Adding one already present is a no-op.
    async fn add_role_permission(&self, id: u64, permission: &str) -> Result<Role, StoreError>;

    /// Removes a permission from a role. Removing an absent one is a no-op.
    async fn remove_role_permission(&self, id: u64, permission: &str)
    -> Result<Role, StoreError>;

    /// Seeds the predefined roles into an empty role table.
    ///
    /// Returns how many roles were created.
    async fn ensure_predefined_roles(&self) -> Result<usize, StoreError> {
        if !self.list_roles().await?.is_empty() {
            return Ok(0);
        }

        for template in RoleTemplate::PREDEFINED {
            self.create_role(template.to_new_role()).await?;
        }

        tracing::info!(count = RoleTemplate::PREDEFINED.len(), "Seeded predefined roles");
        Ok(RoleTemplate::PREDEFINED.len())
    }
}

/// Applies a permission edit in place, reporting whether anything changed.
pub(crate) fn edit_permissions(permissions: &mut PermissionSet, permission: &str, add: bool) -> bool {
    let before = permissions.len();
    if add {
        permissions.add(permission);
    } else {
        permissions.remove(permission);
    }
    permissions.len() != before
}
