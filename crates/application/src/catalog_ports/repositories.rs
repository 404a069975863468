use std::collections::BTreeSet;

use async_trait::async_trait;
use rolegrid_core::{AppResult, PermissionId, RoleId};
use rolegrid_domain::{Permission, Role};

use super::inputs::{
    CreatePermissionInput, CreateRoleInput, PermissionSyncResult, UpdatePermissionInput,
    UpdateRoleInput,
};

/// Read port over the role catalog. Callers may serve it from a cache; stale
/// entries are tolerated by the permission resolver.
#[async_trait]
pub trait RoleCatalog: Send + Sync {
    /// Finds a role with its permissions.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Finds a role by its unique slug.
    async fn find_role_by_slug(&self, slug: &str) -> AppResult<Option<Role>>;

    /// Lists the permissions granted by a role.
    async fn list_permissions_for_role(&self, role_id: RoleId) -> AppResult<Vec<Permission>>;
}

/// Repository port for catalog administration.
#[async_trait]
pub trait CatalogAdminRepository: Send + Sync {
    /// Lists every role with its permissions.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Creates a role without permissions.
    async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role>;

    /// Applies a partial role update.
    async fn update_role(&self, role_id: RoleId, input: UpdateRoleInput) -> AppResult<Role>;

    /// Deletes a role together with its grants and assignments.
    async fn delete_role(&self, role_id: RoleId) -> AppResult<()>;

    /// Replaces the permission set of a role in one transaction.
    async fn sync_role_permissions(
        &self,
        role_id: RoleId,
        permission_ids: BTreeSet<PermissionId>,
    ) -> AppResult<PermissionSyncResult>;

    /// Lists every permission.
    async fn list_permissions(&self) -> AppResult<Vec<Permission>>;

    /// Finds a permission by id.
    async fn find_permission(&self, permission_id: PermissionId)
    -> AppResult<Option<Permission>>;

    /// Creates a permission.
    async fn create_permission(&self, input: CreatePermissionInput) -> AppResult<Permission>;

    /// Applies a partial permission update.
    async fn update_permission(
        &self,
        permission_id: PermissionId,
        input: UpdatePermissionInput,
    ) -> AppResult<Permission>;

    /// Deletes a permission that no role references.
    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()>;
}
