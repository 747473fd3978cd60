use gatehouse_core::errors::ErrorResponse;
use gatehouse_core::{PaginationMeta, PaginationParams};
use gatehouse_models::auth::{
    ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, RefreshTokenRequest,
    RegisterRequest, TokenResponse,
};
use gatehouse_models::roles::{CreateRoleDto, PermissionDto, Role};
use gatehouse_models::users::{
    CreateUserDto, PaginatedUsersResponse, UpdateUserDto, UserFilterParams, UserResponse,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::refresh,
        crate::modules::auth::controller::current_user,
        crate::modules::auth::controller::change_password,
        crate::modules::users::controller::list_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::users::controller::admin_delete_user,
        crate::modules::roles::controller::list_roles,
        crate::modules::roles::controller::get_role,
        crate::modules::roles::controller::create_role,
        crate::modules::roles::controller::add_permission,
        crate::modules::roles::controller::remove_permission,
    ),
    components(
        schemas(
            ErrorResponse,
            LoginRequest,
            LoginResponse,
            RegisterRequest,
            RefreshTokenRequest,
            TokenResponse,
            ChangePasswordRequest,
            MessageResponse,
            UserResponse,
            CreateUserDto,
            UpdateUserDto,
            UserFilterParams,
            PaginatedUsersResponse,
            Role,
            CreateRoleDto,
            PermissionDto,
            PaginationMeta,
            PaginationParams,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and token refresh"),
        (name = "Users", description = "User management"),
        (name = "Roles", description = "Roles and their permissions")
    ),
    info(
        title = "Gatehouse API",
        version = "0.1.0",
        description = "Admin backend with JWT authentication, role/permission policies and per-client rate limiting.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
