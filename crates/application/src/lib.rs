//! Application services and ports.

#![forbid(unsafe_code)]

mod assignment_ports;
mod audit_ports;
mod authorization_service;
mod catalog_ports;
mod catalog_service;
mod permission_resolver;
mod role_sync;
mod user_directory_service;
mod user_ports;
mod user_role_service;

#[cfg(test)]
mod test_support;

pub use assignment_ports::{AssignmentRepository, ScopeSyncTransaction};
pub use audit_ports::{AuditEvent, AuditRepository};
pub use authorization_service::AuthorizationService;
pub use catalog_ports::{
    CatalogAdminRepository, CreatePermissionInput, CreateRoleInput, PermissionMatrix,
    PermissionSyncResult, RoleCatalog, UpdatePermissionInput, UpdateRoleInput,
};
pub use catalog_service::CatalogService;
pub use permission_resolver::EffectivePermissionResolver;
pub use role_sync::{RoleDiff, RoleSyncEngine, RoleSyncOutcome};
pub use user_directory_service::{MAX_USERS_PER_PAGE, UserDirectoryService};
pub use user_ports::{
    CreateUserInput, SortOrder, UpdateUserInput, UserListQuery, UserPage, UserRepository,
    UserSort, UserSortField,
};
pub use user_role_service::{BOOTSTRAP_ROLE_SLUG, UserRoleAssignment, UserRoleService};
