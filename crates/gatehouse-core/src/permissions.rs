//! Permission grants.
//!
//! A role's grants are held in a [`PermissionSet`]: an ordered list of
//! permission strings with set semantics. The wildcard [`ALL`] matches every
//! query, including permissions that did not exist when the role was created.
//!
//! Matching is exact and case-sensitive. `user:*` is not a pattern, it is just
//! another permission string.
//!
//! At the storage boundary the set is (de)serialized as a plain JSON array of
//! strings, in insertion order.
//!
//! # Example
//!
//! ```ignore
//! use gatehouse_core::{PermissionSet, permissions};
//!
//! let mut set = PermissionSet::from_iter([permissions::USER_VIEW]);
//! set.add(permissions::USER_VIEW); // no-op
//! assert_eq!(set.len(), 1);
//!
//! let everything = PermissionSet::from_iter([permissions::ALL]);
//! assert!(everything.has("anything:at-all"));
//! ```

use serde::{Deserialize, Serialize};

/// Wildcard grant matching every permission
pub const ALL: &str = "*";

// =============================================================================
// User permissions
// =============================================================================

/// Permission to view user profiles
pub const USER_VIEW: &str = "user:view";
/// Permission to list users
pub const USER_LIST: &str = "user:list";
/// Permission to read a single user
pub const USER_READ: &str = "user:read";
/// Permission to create users
pub const USER_CREATE: &str = "user:create";
/// Permission to edit user profiles
pub const USER_EDIT: &str = "user:edit";
/// Permission to update users (including role assignment)
pub const USER_UPDATE: &str = "user:update";
/// Permission to delete users
pub const USER_DELETE: &str = "user:delete";
/// Permission to manage user accounts
pub const USER_MANAGE: &str = "user:manage";

// =============================================================================
// Content permissions
// =============================================================================

pub const CONTENT_VIEW: &str = "content:view";
pub const CONTENT_CREATE: &str = "content:create";
pub const CONTENT_EDIT: &str = "content:edit";
pub const CONTENT_DELETE: &str = "content:delete";

// =============================================================================
// Role and system permissions
// =============================================================================

/// Permission to view roles
pub const ROLE_VIEW: &str = "role:view";
/// Permission to change system configuration, including roles
pub const SYSTEM_CONFIG: &str = "system:config";
pub const SYSTEM_LOG: &str = "system:log";
pub const SYSTEM_BACKUP: &str = "system:backup";

/// The permissions granted to a role.
///
/// Membership is a linear scan; sets are expected to stay small. Mutation is
/// not synchronized here, callers own the set through the role update path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PermissionSet(Vec<String>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `permission` is granted directly or through the wildcard.
    pub fn has(&self, permission: &str) -> bool {
        self.0.iter().any(|p| p == permission || p == ALL)
    }

    /// True if the set carries the wildcard grant.
    pub fn is_wildcard(&self) -> bool {
        self.0.iter().any(|p| p == ALL)
    }

    /// Adds `permission` unless it is already present.
    pub fn add(&mut self, permission: impl Into<String>) {
        let permission = permission.into();
        if !self.0.contains(&permission) {
            self.0.push(permission);
        }
    }

    /// Removes the first occurrence of `permission`, if any.
    pub fn remove(&mut self, permission: &str) {
        if let Some(index) = self.0.iter().position(|p| p == permission) {
            self.0.remove(index);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for PermissionSet {
    fn from(permissions: Vec<String>) -> Self {
        permissions.into_iter().collect()
    }
}

impl From<PermissionSet> for Vec<String> {
    fn from(set: PermissionSet) -> Self {
        set.0
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = PermissionSet::new();
        for permission in iter {
            set.add(permission);
        }
        set
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_exact_match() {
        let set = PermissionSet::from_iter([USER_VIEW, CONTENT_VIEW]);
        assert!(set.has(USER_VIEW));
        assert!(set.has(CONTENT_VIEW));
        assert!(!set.has(USER_DELETE));
    }

    #[test]
    fn test_has_is_case_sensitive() {
        let set = PermissionSet::from_iter([USER_VIEW]);
        assert!(!set.has("User:View"));
    }

    #[test]
    fn test_has_no_prefix_matching() {
        let set = PermissionSet::from_iter(["user:*"]);
        assert!(!set.has(USER_VIEW));
        assert!(set.has("user:*"));
    }

    #[test]
    fn test_wildcard_matches_everything() {
        let set = PermissionSet::from_iter([ALL]);
        assert!(set.has(USER_DELETE));
        assert!(set.has(""));
        assert!(set.has("never:seen:before"));
        assert!(set.is_wildcard());
    }

    #[test]
    fn test_empty_set_denies() {
        let set = PermissionSet::new();
        assert!(!set.has(""));
        assert!(!set.has(USER_VIEW));
        assert!(set.is_empty());
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut set = PermissionSet::new();
        set.add(USER_VIEW);
        set.add(USER_VIEW);
        set.add(USER_EDIT);
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice(), &[USER_VIEW.to_string(), USER_EDIT.to_string()]);
    }

    #[test]
    fn test_remove_present_and_absent() {
        let mut set = PermissionSet::from_iter([USER_VIEW, USER_EDIT]);
        set.remove(USER_VIEW);
        assert!(!set.has(USER_VIEW));
        set.remove(USER_DELETE);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_removing_wildcard_revokes_everything() {
        let mut set = PermissionSet::from_iter([ALL, USER_VIEW]);
        set.remove(ALL);
        assert!(set.has(USER_VIEW));
        assert!(!set.has(USER_DELETE));
    }

    #[test]
    fn test_serializes_as_ordered_list() {
        let set = PermissionSet::from_iter([CONTENT_EDIT, USER_VIEW]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["content:edit","user:view"]"#);
    }

    #[test]
    fn test_deserialize_suppresses_duplicates() {
        let set: PermissionSet = serde_json::from_str(r#"["user:view","user:view","*"]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.is_wildcard());
    }
}
