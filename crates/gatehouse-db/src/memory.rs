//! In-memory repository for tests.
//!
//! Mirrors the PostgreSQL store's observable behavior: unique usernames,
//! emails and role codes, role joins resolved at read time, and a deleted
//! role leaving its users role-less.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use gatehouse_models::roles::{NewRole, Role};
use gatehouse_models::users::{NewUser, User, UserChanges};

use crate::error::StoreError;
use crate::repository::{RoleRepository, UserRepository, edit_permissions};

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    users: BTreeMap<u64, StoredUser>,
    roles: BTreeMap<u64, Role>,
    next_user_id: u64,
    next_role_id: u64,
}

/// A user row with its role held by id, like the `users` table.
struct StoredUser {
    user: User,
    role_id: Option<u64>,
}

impl State {
    fn joined(&self, stored: &StoredUser) -> User {
        User {
            role: stored.role_id.and_then(|id| self.roles.get(&id).cloned()),
            ..stored.user.clone()
        }
    }

    fn find_user(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.users
            .values()
            .find(|s| predicate(&s.user))
            .map(|s| self.joined(s))
    }

    fn check_role_ref(&self, role_id: Option<u64>) -> Result<(), StoreError> {
        match role_id {
            Some(id) if !self.roles.contains_key(&id) => Err(StoreError::InvalidReference(
                "users_role_id_fkey".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Detaches a role, leaving its users without one.
    pub fn delete_role(&self, id: u64) -> bool {
        self.lock().roles.remove(&id).is_some()
    }

    fn edit_role(&self, id: u64, permission: &str, add: bool) -> Result<Role, StoreError> {
        let mut state = self.lock();
        let role = state.roles.get_mut(&id).ok_or(StoreError::NotFound)?;
        if edit_permissions(&mut role.permissions, permission, add) {
            role.updated_at = Utc::now();
        }
        Ok(role.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user_by_id(&self, id: u64) -> Result<Option<User>, StoreError> {
        let state = self.lock();
        Ok(state.users.get(&id).map(|s| state.joined(s)))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock().find_user(|u| u.username == username))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock().find_user(|u| u.email == email))
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut state = self.lock();
        if state.users.values().any(|s| s.user.username == new.username) {
            return Err(StoreError::Conflict("username".to_string()));
        }
        if state.users.values().any(|s| s.user.email == new.email) {
            return Err(StoreError::Conflict("email".to_string()));
        }
        state.check_role_ref(new.role_id)?;

        state.next_user_id += 1;
        let id = state.next_user_id;
        let now = Utc::now();
        let stored = StoredUser {
            user: User {
                id,
                username: new.username,
                password_hash: new.password_hash,
                email: new.email,
                nickname: new.nickname,
                status: new.status,
                role: None,
                last_login: None,
                created_at: now,
                updated_at: now,
            },
            role_id: new.role_id,
        };
        let user = state.joined(&stored);
        state.users.insert(id, stored);
        Ok(user)
    }

    async fn update_user(&self, id: u64, changes: UserChanges) -> Result<User, StoreError> {
        let mut state = self.lock();
        if !state.users.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        if let Some(email) = &changes.email {
            if state
                .users
                .values()
                .any(|s| s.user.id != id && &s.user.email == email)
            {
                return Err(StoreError::Conflict("email".to_string()));
            }
        }
        state.check_role_ref(changes.role_id)?;

        let stored = state.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(email) = changes.email {
            stored.user.email = email;
        }
        if let Some(nickname) = changes.nickname {
            stored.user.nickname = nickname;
        }
        if let Some(role_id) = changes.role_id {
            stored.role_id = Some(role_id);
        }
        if let Some(status) = changes.status {
            stored.user.status = status;
        }
        if let Some(hash) = changes.password_hash {
            stored.user.password_hash = hash;
        }
        if let Some(last_login) = changes.last_login {
            stored.user.last_login = Some(last_login);
        }
        stored.user.updated_at = Utc::now();

        let state = &*state;
        state
            .users
            .get(&id)
            .map(|s| state.joined(s))
            .ok_or(StoreError::NotFound)
    }

    async fn delete_user(&self, id: u64) -> Result<bool, StoreError> {
        Ok(self.lock().users.remove(&id).is_some())
    }

    async fn list_users(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), StoreError> {
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let state = self.lock();

        let matches: Vec<&StoredUser> = state
            .users
            .values()
            .filter(|s| match &needle {
                Some(n) => [&s.user.username, &s.user.nickname, &s.user.email]
                    .iter()
                    .any(|field| field.to_lowercase().contains(n.as_str())),
                None => true,
            })
            .collect();

        let total = matches.len() as i64;
        let page = matches
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|s| state.joined(s))
            .collect();
        Ok((page, total))
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        Ok(self.lock().roles.values().cloned().collect())
    }

    async fn find_role_by_id(&self, id: u64) -> Result<Option<Role>, StoreError> {
        Ok(self.lock().roles.get(&id).cloned())
    }

    async fn find_role_by_code(&self, code: &str) -> Result<Option<Role>, StoreError> {
        Ok(self.lock().roles.values().find(|r| r.code == code).cloned())
    }

    async fn create_role(&self, new: NewRole) -> Result<Role, StoreError> {
        let mut state = self.lock();
        if state.roles.values().any(|r| r.code == new.code) {
            return Err(StoreError::Conflict("role code".to_string()));
        }

        state.next_role_id += 1;
        let now = Utc::now();
        let role = Role {
            id: state.next_role_id,
            name: new.name,
            code: new.code,
            description: new.description,
            permissions: new.permissions,
            created_at: now,
            updated_at: now,
        };
        state.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn add_role_permission(&self, id: u64, permission: &str) -> Result<Role, StoreError> {
        self.edit_role(id, permission, true)
    }

    async fn remove_role_permission(
        &self,
        id: u64,
        permission: &str,
    ) -> Result<Role, StoreError> {
        self.edit_role(id, permission, false)
    }
}
