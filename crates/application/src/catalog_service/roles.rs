use std::collections::{BTreeMap, BTreeSet};

use rolegrid_core::{AppError, AppResult, NonEmptyString, PermissionId, RoleId, UserIdentity};
use rolegrid_domain::{
    AccessContext, AdminPermission, AuditAction, Permission, Role, validate_slug,
};
use tracing::info;

use super::CatalogService;
use crate::{CreateRoleInput, PermissionMatrix, PermissionSyncResult, UpdateRoleInput};

impl CatalogService {
    /// Lists roles ordered by level descending, then slug.
    pub async fn list_roles(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
    ) -> AppResult<Vec<Role>> {
        self.require(actor, context, AdminPermission::RolesView)
            .await?;

        let mut roles = self.repository.list_roles().await?;
        sort_roles(&mut roles);
        Ok(roles)
    }

    /// Returns one role with its permissions.
    pub async fn get_role(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        role_id: RoleId,
    ) -> AppResult<Role> {
        self.require(actor, context, AdminPermission::RolesView)
            .await?;
        self.load_role(role_id).await
    }

    /// Creates a role without permissions and emits an audit event.
    pub async fn create_role(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        input: CreateRoleInput,
    ) -> AppResult<Role> {
        let input = CreateRoleInput {
            slug: validate_slug(input.slug.as_str())?,
            name: NonEmptyString::new(input.name)?.into(),
            level: input.level,
            description: input.description,
        };

        self.require(actor, context, AdminPermission::RolesCreate)
            .await?;

        let role = self.repository.create_role(input).await?;
        info!(role_id = %role.id(), slug = role.slug(), "created role");

        self.audit(
            actor,
            AuditAction::RoleCreated,
            "rbac_role",
            role.id().to_string(),
            format!("created role '{}'", role.slug()),
        )
        .await;

        Ok(role)
    }

    /// Applies a partial update to a role and emits an audit event.
    pub async fn update_role(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        role_id: RoleId,
        input: UpdateRoleInput,
    ) -> AppResult<Role> {
        let input = UpdateRoleInput {
            name: input
                .name
                .map(|name| NonEmptyString::new(name).map(String::from))
                .transpose()?,
            level: input.level,
            description: input.description,
        };

        self.require(actor, context, AdminPermission::RolesUpdate)
            .await?;
        self.load_role(role_id).await?;

        let role = self.repository.update_role(role_id, input).await?;

        self.audit(
            actor,
            AuditAction::RoleUpdated,
            "rbac_role",
            role_id.to_string(),
            format!("updated role '{}'", role.slug()),
        )
        .await;

        Ok(role)
    }

    /// Deletes a custom role with its grants and assignments.
    ///
    /// System roles are refused with `Forbidden`.
    pub async fn delete_role(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        role_id: RoleId,
    ) -> AppResult<()> {
        self.require(actor, context, AdminPermission::RolesDelete)
            .await?;

        let role = self.load_role(role_id).await?;
        if role.is_system() {
            return Err(AppError::Forbidden(format!(
                "system role '{}' cannot be deleted",
                role.slug()
            )));
        }

        self.repository.delete_role(role_id).await?;
        info!(%role_id, slug = role.slug(), "deleted role");

        self.audit(
            actor,
            AuditAction::RoleDeleted,
            "rbac_role",
            role_id.to_string(),
            format!("deleted role '{}'", role.slug()),
        )
        .await;

        Ok(())
    }

    /// Lists the permissions granted by a role.
    pub async fn list_role_permissions(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        role_id: RoleId,
    ) -> AppResult<Vec<Permission>> {
        self.require(actor, context, AdminPermission::RolesView)
            .await?;
        self.load_role(role_id).await?;
        self.catalog.list_permissions_for_role(role_id).await
    }

    /// Replaces the permission set of a role and reports the applied counts.
    pub async fn sync_role_permissions(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        role_id: RoleId,
        permission_ids: BTreeSet<PermissionId>,
    ) -> AppResult<PermissionSyncResult> {
        self.require(actor, context, AdminPermission::RolesUpdate)
            .await?;
        let role = self.load_role(role_id).await?;

        let known = self
            .repository
            .list_permissions()
            .await?
            .iter()
            .map(Permission::id)
            .collect::<BTreeSet<_>>();
        if let Some(unknown) = permission_ids.difference(&known).next() {
            return Err(AppError::NotFound(format!(
                "permission '{unknown}' was not found"
            )));
        }

        let result = self
            .repository
            .sync_role_permissions(role_id, permission_ids)
            .await?;
        info!(
            %role_id,
            attached = result.attached,
            detached = result.detached,
            "synchronized role permissions"
        );

        self.audit(
            actor,
            AuditAction::RolePermissionsSynced,
            "rbac_role",
            role_id.to_string(),
            format!(
                "role '{}' permissions synced: {} attached, {} detached",
                role.slug(),
                result.attached,
                result.detached
            ),
        )
        .await;

        Ok(result)
    }

    /// Returns the role by permission grid keyed by role id.
    pub async fn permission_matrix(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
    ) -> AppResult<PermissionMatrix> {
        self.require(actor, context, AdminPermission::RolesView)
            .await?;

        let mut roles = self.repository.list_roles().await?;
        sort_roles(&mut roles);
        let mut permissions = self.repository.list_permissions().await?;
        super::permissions::sort_permissions(&mut permissions);

        let matrix = roles
            .iter()
            .map(|role| {
                (
                    role.id(),
                    role.permissions().iter().map(Permission::id).collect(),
                )
            })
            .collect::<BTreeMap<_, _>>();

        Ok(PermissionMatrix {
            roles,
            permissions,
            matrix,
        })
    }

    async fn load_role(&self, role_id: RoleId) -> AppResult<Role> {
        self.catalog
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }
}

fn sort_roles(roles: &mut [Role]) {
    roles.sort_by(|left, right| {
        right
            .level()
            .cmp(&left.level())
            .then_with(|| left.slug().cmp(right.slug()))
    });
}
