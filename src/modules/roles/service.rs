use gatehouse_core::AppError;
use gatehouse_db::{RoleRepository, StoreError};
use gatehouse_models::roles::{CreateRoleDto, Role};
use tracing::{info, instrument};

pub struct RoleService;

impl RoleService {
    #[instrument(skip(roles))]
    pub async fn list_roles(roles: &dyn RoleRepository) -> Result<Vec<Role>, AppError> {
        roles.list_roles().await.map_err(|e| e.into_app_error("role"))
    }

    #[instrument(skip(roles))]
    pub async fn get_role(roles: &dyn RoleRepository, id: u64) -> Result<Role, AppError> {
        roles
            .find_role_by_id(id)
            .await
            .map_err(|e| e.into_app_error("role"))?
            .ok_or_else(|| StoreError::NotFound.into_app_error("role"))
    }

    #[instrument(skip(roles))]
    pub async fn create_role(roles: &dyn RoleRepository, dto: CreateRoleDto) -> Result<Role, AppError> {
        let role = roles
            .create_role(dto.into())
            .await
            .map_err(|e| e.into_app_error("role"))?;

        info!(role_id = role.id, code = %role.code, "Role created");
        Ok(role)
    }

    /// Grants `permission` to every holder of the role, effective on their
    /// next request.
    #[instrument(skip(roles))]
    pub async fn add_permission(
        roles: &dyn RoleRepository,
        id: u64,
        permission: &str,
    ) -> Result<Role, AppError> {
        let role = roles
            .add_role_permission(id, permission)
            .await
            .map_err(|e| e.into_app_error("role"))?;

        info!(role_id = role.id, permission, "Permission granted to role");
        Ok(role)
    }

    #[instrument(skip(roles))]
    pub async fn remove_permission(
        roles: &dyn RoleRepository,
        id: u64,
        permission: &str,
    ) -> Result<Role, AppError> {
        let role = roles
            .remove_role_permission(id, permission)
            .await
            .map_err(|e| e.into_app_error("role"))?;

        info!(role_id = role.id, permission, "Permission revoked from role");
        Ok(role)
    }
}
