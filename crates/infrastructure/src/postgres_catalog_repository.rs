use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use rolegrid_application::{
    CatalogAdminRepository, CreatePermissionInput, CreateRoleInput, PermissionSyncResult,
    RoleCatalog, UpdatePermissionInput, UpdateRoleInput,
};
use rolegrid_core::{AppError, AppResult, PermissionId, RoleId};
use rolegrid_domain::{Permission, Role};

use crate::sqlx_errors::{is_foreign_key_violation, is_unique_violation, store_error};

mod permissions;
mod roles;


/// PostgreSQL-backed role and permission catalog.
#[derive(Clone)]
pub struct PostgresCatalogRepository {
    pool: PgPool,
}

impl PostgresCatalogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role_id: Uuid,
    role_slug: String,
    role_name: String,
    role_level: i32,
    role_description: Option<String>,
    permission_id: Option<Uuid>,
    permission_slug: Option<String>,
    permission_name: Option<String>,
    permission_group: Option<String>,
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: Uuid,
    slug: String,
    name: String,
    permission_group: Option<String>,
}

impl TryFrom<PermissionRow> for Permission {
    type Error = AppError;

    fn try_from(row: PermissionRow) -> Result<Self, Self::Error> {
        Permission::new(
            PermissionId::from_uuid(row.id),
            row.slug.as_str(),
            row.name,
            row.permission_group,
        )
        .map_err(|error| {
            AppError::Internal(format!("stored permission '{}' is invalid: {error}", row.id))
        })
    }
}

/// Folds joined role/permission rows into roles, keeping first-seen order.
fn aggregate_roles(rows: Vec<RoleRow>) -> AppResult<Vec<Role>> {
    let mut roles: Vec<(Role, Vec<Permission>)> = Vec::new();

    for row in rows {
        let role_id = RoleId::from_uuid(row.role_id);
        if roles.last().is_none_or(|(role, _)| role.id() != role_id) {
            let role = Role::new(
                role_id,
                row.role_slug.as_str(),
                row.role_name,
                row.role_level,
                row.role_description,
            )
            .map_err(|error| {
                AppError::Internal(format!("stored role '{role_id}' is invalid: {error}"))
            })?;
            roles.push((role, Vec::new()));
        }

        if let (Some(id), Some(slug), Some(name)) =
            (row.permission_id, row.permission_slug, row.permission_name)
        {
            let permission = Permission::try_from(PermissionRow {
                id,
                slug,
                name,
                permission_group: row.permission_group,
            })?;
            if let Some((_, permissions)) = roles.last_mut() {
                permissions.push(permission);
            }
        }
    }

    Ok(roles
        .into_iter()
        .map(|(role, permissions)| role.with_permissions(permissions))
        .collect())
}

fn role_write_error(error: sqlx::Error, slug: &str, operation: &str) -> AppError {
    if is_unique_violation(&error) {
        return AppError::Conflict(format!("role '{slug}' already exists"));
    }

    store_error(error, operation)
}

fn permission_write_error(error: sqlx::Error, slug: &str, operation: &str) -> AppError {
    if is_unique_violation(&error) {
        return AppError::Conflict(format!("permission '{slug}' already exists"));
    }

    store_error(error, operation)
}

#[async_trait]
impl RoleCatalog for PostgresCatalogRepository {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        self.find_role_impl(role_id).await
    }

    async fn find_role_by_slug(&self, slug: &str) -> AppResult<Option<Role>> {
        self.find_role_by_slug_impl(slug).await
    }

    async fn list_permissions_for_role(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        self.list_permissions_for_role_impl(role_id).await
    }
}

#[async_trait]
impl CatalogAdminRepository for PostgresCatalogRepository {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.list_roles_impl().await
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role> {
        self.create_role_impl(input).await
    }

    async fn update_role(&self, role_id: RoleId, input: UpdateRoleInput) -> AppResult<Role> {
        self.update_role_impl(role_id, input).await
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        self.delete_role_impl(role_id).await
    }

    async fn sync_role_permissions(
        &self,
        role_id: RoleId,
        permission_ids: BTreeSet<PermissionId>,
    ) -> AppResult<PermissionSyncResult> {
        self.sync_role_permissions_impl(role_id, permission_ids)
            .await
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        self.list_permissions_impl().await
    }

    async fn find_permission(
        &self,
        permission_id: PermissionId,
    ) -> AppResult<Option<Permission>> {
        self.find_permission_impl(permission_id).await
    }

    async fn create_permission(&self, input: CreatePermissionInput) -> AppResult<Permission> {
        self.create_permission_impl(input).await
    }

    async fn update_permission(
        &self,
        permission_id: PermissionId,
        input: UpdatePermissionInput,
    ) -> AppResult<Permission> {
        self.update_permission_impl(permission_id, input).await
    }

    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()> {
        self.delete_permission_impl(permission_id).await
    }
}
