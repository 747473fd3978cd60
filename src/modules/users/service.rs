use gatehouse_core::{AppError, PaginationMeta, hash_password};
use gatehouse_db::{RoleRepository, UserRepository};
use gatehouse_models::roles::RoleTemplate;
use gatehouse_models::users::{
    CreateUserDto, NewUser, PaginatedUsersResponse, UpdateUserDto, User, UserChanges,
    UserFilterParams, UserStatus,
};
use tracing::{info, instrument};

use crate::metrics::track_user_created;

pub struct UserService;

impl UserService {
    #[instrument(skip(users))]
    pub async fn list_users(
        users: &dyn UserRepository,
        filters: UserFilterParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let search = filters
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let pagination = &filters.pagination;

        let (page, total) = users
            .list_users(search, pagination.page_size(), pagination.offset())
            .await
            .map_err(|e| e.into_app_error("user"))?;

        Ok(PaginatedUsersResponse {
            data: page.into_iter().map(Into::into).collect(),
            meta: PaginationMeta::new(pagination, total),
        })
    }

    #[instrument(skip(users))]
    pub async fn get_user(users: &dyn UserRepository, id: u64) -> Result<User, AppError> {
        users
            .find_user_by_id(id)
            .await
            .map_err(|e| e.into_app_error("user"))?
            .ok_or_else(|| gatehouse_db::StoreError::NotFound.into_app_error("user"))
    }

    /// Creates an active user. Without `role_id` the user gets the `user` role.
    #[instrument(skip(users, roles, dto), fields(username = %dto.username))]
    pub async fn create_user(
        users: &dyn UserRepository,
        roles: &dyn RoleRepository,
        dto: CreateUserDto,
    ) -> Result<User, AppError> {
        let role_id = match dto.role_id {
            Some(id) => Some(id),
            None => roles
                .find_role_by_code(RoleTemplate::USER.code)
                .await
                .map_err(|e| e.into_app_error("role"))?
                .map(|role| role.id),
        };

        let user = users
            .create_user(NewUser {
                username: dto.username,
                password_hash: hash_password(&dto.password)?,
                email: dto.email,
                nickname: dto.nickname,
                role_id,
                status: UserStatus::Active,
            })
            .await
            .map_err(|e| e.into_app_error("user"))?;

        track_user_created(user.role_code().unwrap_or("none"));
        info!(user_id = user.id, role = ?user.role_code(), "User created");
        Ok(user)
    }

    #[instrument(skip(users))]
    pub async fn update_user(
        users: &dyn UserRepository,
        id: u64,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        let changes = UserChanges {
            email: dto.email,
            nickname: dto.nickname,
            role_id: dto.role_id,
            ..UserChanges::default()
        };

        let user = users
            .update_user(id, changes)
            .await
            .map_err(|e| e.into_app_error("user"))?;

        info!(user_id = user.id, role = ?user.role_code(), "User updated");
        Ok(user)
    }

    #[instrument(skip(users))]
    pub async fn delete_user(users: &dyn UserRepository, id: u64) -> Result<(), AppError> {
        let deleted = users
            .delete_user(id)
            .await
            .map_err(|e| e.into_app_error("user"))?;
        if !deleted {
            return Err(gatehouse_db::StoreError::NotFound.into_app_error("user"));
        }

        info!(user_id = id, "User deleted");
        Ok(())
    }
}
