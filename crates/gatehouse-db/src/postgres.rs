//! PostgreSQL repository.
//!
//! Ids are `BIGSERIAL` in the database and `u64` in the domain. A lookup by
//! an id that does not fit in `i64` cannot match any row and is reported as
//! absent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use gatehouse_core::PermissionSet;
use gatehouse_models::roles::{NewRole, Role};
use gatehouse_models::users::{NewUser, User, UserChanges, UserStatus};

use crate::error::StoreError;
use crate::repository::{RoleRepository, UserRepository, edit_permissions};

const USER_SELECT: &str = r#"
    SELECT u.id, u.username, u.password, u.email, u.nickname, u.status,
           u.last_login, u.created_at, u.updated_at,
           r.id AS role_id, r.name AS role_name, r.code AS role_code,
           r.description AS role_description, r.permissions AS role_permissions,
           r.created_at AS role_created_at, r.updated_at AS role_updated_at
    FROM users u
    LEFT JOIN roles r ON r.id = u.role_id
"#;

const USER_SEARCH: &str = r#"
    WHERE ($1::TEXT IS NULL
        OR u.username ILIKE $1
        OR u.nickname ILIKE $1
        OR u.email ILIKE $1)
"#;

const ROLE_COLUMNS: &str = "id, name, code, description, permissions, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_user_where(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<User>, StoreError> {
        let sql = format!("{USER_SELECT} WHERE {column} = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn edit_role_permissions(
        &self,
        id: u64,
        permission: &str,
        add: bool,
    ) -> Result<Role, StoreError> {
        let id = to_db_id(id).ok_or(StoreError::NotFound)?;
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, RoleRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound)?;
        let mut role = Role::try_from(row)?;

        if edit_permissions(&mut role.permissions, permission, add) {
            let sql = format!(
                "UPDATE roles SET permissions = $2, updated_at = NOW() WHERE id = $1 RETURNING {ROLE_COLUMNS}"
            );
            let row = sqlx::query_as::<_, RoleRow>(&sql)
                .bind(id)
                .bind(Json(Vec::<String>::from(role.permissions.clone())))
                .fetch_one(&mut *tx)
                .await?;
            role = Role::try_from(row)?;
        }

        tx.commit().await?;
        Ok(role)
    }
}

fn to_db_id(id: u64) -> Option<i64> {
    i64::try_from(id).ok()
}

fn from_db_id(id: i64) -> Result<u64, StoreError> {
    u64::try_from(id).map_err(|_| StoreError::Backend(format!("negative id {id}")))
}

#[derive(FromRow)]
struct RoleRow {
    id: i64,
    name: String,
    code: String,
    description: Option<String>,
    permissions: Json<Vec<String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RoleRow> for Role {
    type Error = StoreError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        Ok(Role {
            id: from_db_id(row.id)?,
            name: row.name,
            code: row.code,
            description: row.description,
            permissions: row.permissions.0.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password: String,
    email: String,
    nickname: String,
    status: i16,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    role_id: Option<i64>,
    role_name: Option<String>,
    role_code: Option<String>,
    role_description: Option<String>,
    role_permissions: Option<Json<Vec<String>>>,
    role_created_at: Option<DateTime<Utc>>,
    role_updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = match (
            row.role_id,
            row.role_name,
            row.role_code,
            row.role_created_at,
            row.role_updated_at,
        ) {
            (Some(id), Some(name), Some(code), Some(created_at), Some(updated_at)) => Some(Role {
                id: from_db_id(id)?,
                name,
                code,
                description: row.role_description,
                permissions: row
                    .role_permissions
                    .map(|p| PermissionSet::from(p.0))
                    .unwrap_or_default(),
                created_at,
                updated_at,
            }),
            _ => None,
        };

        let status = UserStatus::from_i16(row.status)
            .ok_or_else(|| StoreError::Backend(format!("unknown user status {}", row.status)))?;

        Ok(User {
            id: from_db_id(row.id)?,
            username: row.username,
            password_hash: row.password,
            email: row.email,
            nickname: row.nickname,
            status,
            role,
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl UserRepository for PgStore {
    #[instrument(skip(self))]
    async fn find_user_by_id(&self, id: u64) -> Result<Option<User>, StoreError> {
        let Some(id) = to_db_id(id) else {
            return Ok(None);
        };
        let sql = format!("{USER_SELECT} WHERE u.id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.fetch_user_where("u.username", username).await
    }

    #[instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.fetch_user_where("u.email", email).await
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let role_id = match user.role_id {
            Some(id) => Some(to_db_id(id).ok_or_else(|| {
                StoreError::InvalidReference("users_role_id_fkey".to_string())
            })?),
            None => None,
        };

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, password, email, nickname, role_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(&user.nickname)
        .bind(role_id)
        .bind(user.status.as_i16())
        .fetch_one(&self.pool)
        .await?;

        self.find_user_by_id(from_db_id(id)?)
            .await?
            .ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self, changes))]
    async fn update_user(&self, id: u64, changes: UserChanges) -> Result<User, StoreError> {
        let db_id = to_db_id(id).ok_or(StoreError::NotFound)?;
        let role_id = match changes.role_id {
            Some(role_id) => Some(to_db_id(role_id).ok_or_else(|| {
                StoreError::InvalidReference("users_role_id_fkey".to_string())
            })?),
            None => None,
        };

        let result = sqlx::query(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                nickname = COALESCE($3, nickname),
                role_id = COALESCE($4, role_id),
                status = COALESCE($5, status),
                password = COALESCE($6, password),
                last_login = COALESCE($7, last_login),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(db_id)
        .bind(changes.email)
        .bind(changes.nickname)
        .bind(role_id)
        .bind(changes.status.map(UserStatus::as_i16))
        .bind(changes.password_hash)
        .bind(changes.last_login)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        self.find_user_by_id(id).await?.ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: u64) -> Result<bool, StoreError> {
        let Some(id) = to_db_id(id) else {
            return Ok(false);
        };
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn list_users(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), StoreError> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));

        let count_sql = format!("SELECT COUNT(*) FROM users u {USER_SEARCH}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!("{USER_SELECT} {USER_SEARCH} ORDER BY u.id LIMIT $2 OFFSET $3");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((users, total))
    }
}

#[async_trait]
impl RoleRepository for PgStore {
    #[instrument(skip(self))]
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles ORDER BY id");
        let rows = sqlx::query_as::<_, RoleRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Role::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn find_role_by_id(&self, id: u64) -> Result<Option<Role>, StoreError> {
        let Some(id) = to_db_id(id) else {
            return Ok(None);
        };
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1");
        let row = sqlx::query_as::<_, RoleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Role::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_role_by_code(&self, code: &str) -> Result<Option<Role>, StoreError> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE code = $1");
        let row = sqlx::query_as::<_, RoleRow>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Role::try_from).transpose()
    }

    #[instrument(skip(self, role), fields(code = %role.code))]
    async fn create_role(&self, role: NewRole) -> Result<Role, StoreError> {
        let sql = format!(
            "INSERT INTO roles (name, code, description, permissions) VALUES ($1, $2, $3, $4) RETURNING {ROLE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RoleRow>(&sql)
            .bind(role.name)
            .bind(role.code)
            .bind(role.description)
            .bind(Json(Vec::<String>::from(role.permissions)))
            .fetch_one(&self.pool)
            .await?;
        Role::try_from(row)
    }

    #[instrument(skip(self))]
    async fn add_role_permission(&self, id: u64, permission: &str) -> Result<Role, StoreError> {
        self.edit_role_permissions(id, permission, true).await
    }

    #[instrument(skip(self))]
    async fn remove_role_permission(
        &self,
        id: u64,
        permission: &str,
    ) -> Result<Role, StoreError> {
        self.edit_role_permissions(id, permission, false).await
    }
}
