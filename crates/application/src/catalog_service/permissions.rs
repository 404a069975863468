use rolegrid_core::{AppError, AppResult, NonEmptyString, PermissionId, UserIdentity};
use rolegrid_domain::{AccessContext, AdminPermission, AuditAction, Permission, validate_slug};
use tracing::info;

use super::CatalogService;
use crate::{CreatePermissionInput, UpdatePermissionInput};

impl CatalogService {
    /// Lists permissions ordered by group, then slug.
    pub async fn list_permissions(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
    ) -> AppResult<Vec<Permission>> {
        self.require(actor, context, AdminPermission::RolesView)
            .await?;

        let mut permissions = self.repository.list_permissions().await?;
        sort_permissions(&mut permissions);
        Ok(permissions)
    }

    /// Returns one permission.
    pub async fn get_permission(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        permission_id: PermissionId,
    ) -> AppResult<Permission> {
        self.require(actor, context, AdminPermission::RolesView)
            .await?;
        self.load_permission(permission_id).await
    }

    /// Creates a permission and emits an audit event.
    pub async fn create_permission(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        input: CreatePermissionInput,
    ) -> AppResult<Permission> {
        let input = CreatePermissionInput {
            slug: validate_slug(input.slug.as_str())?,
            name: NonEmptyString::new(input.name)?.into(),
            group: input.group,
        };

        self.require(actor, context, AdminPermission::PermissionsManage)
            .await?;

        let permission = self.repository.create_permission(input).await?;
        info!(
            permission_id = %permission.id(),
            slug = permission.slug(),
            "created permission"
        );

        self.audit(
            actor,
            AuditAction::PermissionCreated,
            "rbac_permission",
            permission.id().to_string(),
            format!("created permission '{}'", permission.slug()),
        )
        .await;

        Ok(permission)
    }

    /// Applies a partial update to a permission and emits an audit event.
    pub async fn update_permission(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        permission_id: PermissionId,
        input: UpdatePermissionInput,
    ) -> AppResult<Permission> {
        let input = UpdatePermissionInput {
            slug: input
                .slug
                .map(|slug| validate_slug(slug.as_str()))
                .transpose()?,
            name: input
                .name
                .map(|name| NonEmptyString::new(name).map(String::from))
                .transpose()?,
            group: input.group,
        };

        self.require(actor, context, AdminPermission::PermissionsManage)
            .await?;
        self.load_permission(permission_id).await?;

        let permission = self
            .repository
            .update_permission(permission_id, input)
            .await?;

        self.audit(
            actor,
            AuditAction::PermissionUpdated,
            "rbac_permission",
            permission_id.to_string(),
            format!("updated permission '{}'", permission.slug()),
        )
        .await;

        Ok(permission)
    }

    /// Deletes a permission that no role grants.
    pub async fn delete_permission(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        self.require(actor, context, AdminPermission::PermissionsManage)
            .await?;

        let permission = self.load_permission(permission_id).await?;
        self.repository.delete_permission(permission_id).await?;
        info!(%permission_id, slug = permission.slug(), "deleted permission");

        self.audit(
            actor,
            AuditAction::PermissionDeleted,
            "rbac_permission",
            permission_id.to_string(),
            format!("deleted permission '{}'", permission.slug()),
        )
        .await;

        Ok(())
    }

    async fn load_permission(&self, permission_id: PermissionId) -> AppResult<Permission> {
        self.repository
            .find_permission(permission_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("permission '{permission_id}' was not found"))
            })
    }
}

pub(super) fn sort_permissions(permissions: &mut [Permission]) {
    permissions.sort_by(|left, right| {
        left.group()
            .cmp(&right.group())
            .then_with(|| left.slug().cmp(right.slug()))
    });
}
