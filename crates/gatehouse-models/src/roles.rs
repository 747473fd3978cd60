//! Role domain models and DTOs.
//!
//! A role is a named, uniquely coded bundle of permissions. Four roles are
//! predefined and seeded into an empty store at startup; further roles can
//! be created at runtime.

use gatehouse_core::PermissionSet;
use gatehouse_core::permissions::{
    ALL, CONTENT_CREATE, CONTENT_EDIT, CONTENT_VIEW, USER_EDIT, USER_VIEW,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Role {
    pub id: u64,
    pub name: String,
    /// Unique, stable identifier used by role-based policies
    pub code: String,
    pub description: Option<String>,
    #[schema(value_type = Vec<String>, example = json!(["user:view", "content:view"]))]
    pub permissions: PermissionSet,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Role {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.has(permission)
    }
}

/// A role that exists in every deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleTemplate {
    pub name: &'static str,
    pub code: &'static str,
    pub description: &'static str,
    pub permissions: &'static [&'static str],
}

impl RoleTemplate {
    pub const SUPERUSER: RoleTemplate = RoleTemplate {
        name: "Super Administrator",
        code: "superuser",
        description: "Unrestricted access to the whole system",
        permissions: &[ALL],
    };

    pub const ADMIN: RoleTemplate = RoleTemplate {
        name: "Administrator",
        code: "admin",
        description: "Manages users, roles and content",
        permissions: &[ALL],
    };

    pub const USER: RoleTemplate = RoleTemplate {
        name: "User",
        code: "user",
        description: "Regular account",
        permissions: &[USER_VIEW, USER_EDIT, CONTENT_VIEW, CONTENT_CREATE, CONTENT_EDIT],
    };

    pub const GUEST: RoleTemplate = RoleTemplate {
        name: "Guest",
        code: "guest",
        description: "Read-only account",
        permissions: &[USER_VIEW, CONTENT_VIEW],
    };

    pub const PREDEFINED: [RoleTemplate; 4] =
        [Self::SUPERUSER, Self::ADMIN, Self::USER, Self::GUEST];

    /// Looks up a predefined role by code.
    pub fn by_code(code: &str) -> Option<RoleTemplate> {
        Self::PREDEFINED.into_iter().find(|t| t.code == code)
    }

    pub fn permission_set(&self) -> PermissionSet {
        self.permissions.iter().copied().collect()
    }

    pub fn to_new_role(&self) -> NewRole {
        NewRole {
            name: self.name.to_string(),
            code: self.code.to_string(),
            description: Some(self.description.to_string()),
            permissions: self.permission_set(),
        }
    }
}

/// Input for persisting a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub permissions: PermissionSet,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateRoleDto {
    #[validate(length(min = 2, max = 50, message = "Role name must be between 2 and 50 characters"))]
    pub name: String,
    #[validate(length(min = 2, max = 50, message = "Role code must be between 2 and 50 characters"))]
    #[schema(example = "editor")]
    pub code: String,
    #[validate(length(max = 200, message = "Description must not exceed 200 characters"))]
    pub description: Option<String>,
    #[serde(default)]
    #[schema(example = json!(["content:view", "content:edit"]))]
    pub permissions: Vec<String>,
}

impl From<CreateRoleDto> for NewRole {
    fn from(dto: CreateRoleDto) -> Self {
        Self {
            name: dto.name,
            code: dto.code,
            description: dto.description,
            permissions: dto.permissions.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PermissionDto {
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "user:list")]
    pub permission: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined_codes_are_unique() {
        let mut codes: Vec<&str> = RoleTemplate::PREDEFINED.iter().map(|t| t.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), RoleTemplate::PREDEFINED.len());
    }

    #[test]
    fn test_admin_and_superuser_are_wildcards() {
        assert!(RoleTemplate::ADMIN.permission_set().is_wildcard());
        assert!(RoleTemplate::SUPERUSER.permission_set().is_wildcard());
    }

    #[test]
    fn test_guest_is_read_only() {
        let guest = RoleTemplate::GUEST.permission_set();
        assert!(guest.has(USER_VIEW));
        assert!(guest.has(CONTENT_VIEW));
        assert!(!guest.has(CONTENT_EDIT));
        assert_eq!(guest.len(), 2);
    }

    #[test]
    fn test_by_code() {
        assert_eq!(RoleTemplate::by_code("user"), Some(RoleTemplate::USER));
        assert_eq!(RoleTemplate::by_code("Admin"), None);
    }

    #[test]
    fn test_create_role_dto_dedups_permissions() {
        let dto = CreateRoleDto {
            name: "Editor".to_string(),
            code: "editor".to_string(),
            description: None,
            permissions: vec!["content:edit".to_string(), "content:edit".to_string()],
        };
        assert!(dto.validate().is_ok());
        let role: NewRole = dto.into();
        assert_eq!(role.permissions.len(), 1);
    }

    #[test]
    fn test_create_role_dto_rejects_short_code() {
        let dto = CreateRoleDto {
            name: "Editor".to_string(),
            code: "e".to_string(),
            description: None,
            permissions: vec![],
        };
        assert!(dto.validate().is_err());
    }
}
