use std::collections::BTreeSet;
use std::sync::Arc;

use rolegrid_core::{AppError, AppResult, BranchId, OrganizationId, RoleId, UserId, UserIdentity};
use rolegrid_domain::{
    AccessContext, AdminPermission, AssignmentKey, AuditAction, Permission, Role, RoleAssignment,
    Scope, UserAccount,
};
use tracing::{info, warn};

use crate::{
    AssignmentRepository, AuditEvent, AuditRepository, AuthorizationService, RoleCatalog,
    RoleSyncEngine, RoleSyncOutcome, UserRepository,
};


/// Slug of the role granted by operator bootstrap.
pub const BOOTSTRAP_ROLE_SLUG: &str = "admin";

/// Assignment joined with its catalog role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRoleAssignment {
    /// Stored assignment.
    pub assignment: RoleAssignment,
    /// Catalog role, absent when the assignment references a deleted role.
    pub role: Option<Role>,
}

/// Application service for scoped user role administration.
#[derive(Clone)]
pub struct UserRoleService {
    authorization_service: AuthorizationService,
    assignments: Arc<dyn AssignmentRepository>,
    catalog: Arc<dyn RoleCatalog>,
    users: Arc<dyn UserRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    sync_engine: RoleSyncEngine,
}

impl UserRoleService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        assignments: Arc<dyn AssignmentRepository>,
        catalog: Arc<dyn RoleCatalog>,
        users: Arc<dyn UserRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            sync_engine: RoleSyncEngine::new(assignments.clone()),
            assignments,
            catalog,
            users,
            audit_repository,
        }
    }

    /// Lists every assignment of a user across scopes, joined with its role.
    pub async fn list_user_roles(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        user_id: UserId,
    ) -> AppResult<Vec<UserRoleAssignment>> {
        self.authorization_service
            .require_permission(actor, context, AdminPermission::UsersView)
            .await?;
        self.load_user(user_id).await?;

        let mut assignments = self.assignments.list_for_user(user_id).await?;
        assignments.sort_by(|left, right| {
            left.scope
                .cmp(&right.scope)
                .then_with(|| left.created_at.cmp(&right.created_at))
        });

        let mut joined = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let role = self.catalog.find_role(assignment.role_id).await?;
            joined.push(UserRoleAssignment { assignment, role });
        }

        Ok(joined)
    }

    /// Grants one role to a user in the given scope.
    ///
    /// Fails with `DuplicateAssignment` when the exact assignment exists.
    pub async fn assign_role(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        user_id: UserId,
        role_id: RoleId,
        organization_id: Option<OrganizationId>,
        branch_id: Option<BranchId>,
    ) -> AppResult<RoleAssignment> {
        let scope = Scope::from_parts(organization_id, branch_id)?;

        self.authorization_service
            .require_permission(actor, context, AdminPermission::UsersUpdate)
            .await?;
        self.load_user(user_id).await?;
        let role = self.load_role(role_id).await?;

        let assignment = self
            .assignments
            .insert_assignment(AssignmentKey::new(user_id, role_id, scope))
            .await?;
        info!(%user_id, %role_id, %scope, "assigned role");

        self.audit(
            actor,
            AuditAction::UserRoleAssigned,
            user_id,
            format!("assigned role '{}' in {scope}", role.slug()),
        )
        .await;

        Ok(assignment)
    }

    /// Revokes one role from a user in the given scope and returns the number
    /// of removed assignments. Revoking a missing assignment returns `0`.
    pub async fn remove_role(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        user_id: UserId,
        role_id: RoleId,
        organization_id: Option<OrganizationId>,
        branch_id: Option<BranchId>,
    ) -> AppResult<u64> {
        let scope = Scope::from_parts(organization_id, branch_id)?;

        self.authorization_service
            .require_permission(actor, context, AdminPermission::UsersUpdate)
            .await?;
        self.load_user(user_id).await?;

        let removed = self
            .assignments
            .remove_assignment(AssignmentKey::new(user_id, role_id, scope))
            .await?;

        if removed > 0 {
            info!(%user_id, %role_id, %scope, "removed role");
            self.audit(
                actor,
                AuditAction::UserRoleRemoved,
                user_id,
                format!("removed role '{role_id}' in {scope}"),
            )
            .await;
        }

        Ok(removed)
    }

    /// Makes the user's roles in exactly one scope equal the desired set.
    pub async fn sync_roles(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        user_id: UserId,
        desired_role_ids: BTreeSet<RoleId>,
        organization_id: Option<OrganizationId>,
        branch_id: Option<BranchId>,
    ) -> AppResult<RoleSyncOutcome> {
        let scope = Scope::from_parts(organization_id, branch_id)?;

        self.authorization_service
            .require_permission(actor, context, AdminPermission::UsersUpdate)
            .await?;
        self.load_user(user_id).await?;
        for role_id in &desired_role_ids {
            self.load_role(*role_id).await?;
        }

        let outcome = self
            .sync_engine
            .sync_scope(user_id, &desired_role_ids, scope)
            .await?;

        self.audit(
            actor,
            AuditAction::UserRolesSynced,
            user_id,
            format!(
                "synced roles in {scope}: {} attached, {} detached",
                outcome.attached.len(),
                outcome.detached.len()
            ),
        )
        .await;

        Ok(outcome)
    }

    /// Returns the permissions a user holds in the target context.
    pub async fn effective_permissions(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        user_id: UserId,
        target: &AccessContext,
    ) -> AppResult<Vec<Permission>> {
        self.authorization_service
            .require_permission(actor, context, AdminPermission::UsersView)
            .await?;

        self.authorization_service
            .resolver()
            .resolve_effective_permissions(user_id, target)
            .await
    }

    /// Returns the caller's own permissions in the request context.
    pub async fn own_permissions(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
    ) -> AppResult<Vec<Permission>> {
        self.authorization_service
            .resolver()
            .resolve_effective_permissions(actor.user_id(), context)
            .await
    }

    /// Grants the bootstrap role globally to a user with no assignments.
    ///
    /// Returns whether a grant was made.
    pub async fn ensure_bootstrap_admin(&self, user_id: UserId) -> AppResult<bool> {
        if !self.assignments.list_for_user(user_id).await?.is_empty() {
            return Ok(false);
        }

        let Some(role) = self.catalog.find_role_by_slug(BOOTSTRAP_ROLE_SLUG).await? else {
            warn!(%user_id, "bootstrap role is missing from the catalog");
            return Err(AppError::Internal(format!(
                "bootstrap role '{BOOTSTRAP_ROLE_SLUG}' is not seeded"
            )));
        };

        match self
            .assignments
            .insert_assignment(AssignmentKey::new(user_id, role.id(), Scope::Global))
            .await
        {
            Ok(_) => {
                info!(%user_id, "granted bootstrap admin role");
                Ok(true)
            }
            Err(AppError::DuplicateAssignment(_)) => Ok(false),
            Err(error) => Err(error),
        }
    }

    async fn load_user(&self, user_id: UserId) -> AppResult<UserAccount> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' was not found")))
    }

    async fn load_role(&self, role_id: RoleId) -> AppResult<Role> {
        self.catalog
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    /// Appends an audit event for an assignment change that is already
    /// committed. A failed append is logged and does not fail the request.
    async fn audit(
        &self,
        actor: &UserIdentity,
        action: AuditAction,
        user_id: UserId,
        detail: String,
    ) {
        let appended = self
            .audit_repository
            .append_event(AuditEvent {
                actor_user_id: actor.user_id(),
                subject: actor.subject().to_owned(),
                action,
                resource_type: "rbac_user_role".to_owned(),
                resource_id: user_id.to_string(),
                detail: Some(detail),
            })
            .await;

        if let Err(error) = appended {
            warn!(%user_id, action = action.as_str(), %error, "failed to append audit event");
        }
    }
}
