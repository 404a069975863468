mod inputs;
mod repositories;

pub use inputs::{
    CreatePermissionInput, CreateRoleInput, PermissionMatrix, PermissionSyncResult,
    UpdatePermissionInput, UpdateRoleInput,
};
pub use repositories::{CatalogAdminRepository, RoleCatalog};
