mod assignments;
mod auth;
mod catalog;
mod common;
mod users;

pub use assignments::{
    AssignRoleRequest, EffectivePermissionsQuery, EffectivePermissionsResponse,
    RemoveRoleRequest, RemoveRoleResponse, RoleAssignmentResponse, SyncUserRolesRequest,
    SyncUserRolesResponse, UserRoleResponse,
};
pub use auth::BootstrapRequest;
pub use catalog::{
    CreatePermissionRequest, CreateRoleRequest, PermissionMatrixResponse, PermissionResponse,
    PermissionSyncResponse, RoleResponse, SyncRolePermissionsRequest, UpdatePermissionRequest,
    UpdateRoleRequest,
};
pub use common::{HealthResponse, UserIdentityResponse};
pub use users::{
    CreateUserRequest, PageMetaResponse, UpdateUserRequest, UserListParams, UserPageResponse,
    UserResponse,
};
