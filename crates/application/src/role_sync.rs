use std::collections::BTreeSet;
use std::sync::Arc;

use rolegrid_core::{AppResult, BranchId, OrganizationId, RoleId, UserId};
use rolegrid_domain::Scope;
use tracing::{debug, info};

use crate::AssignmentRepository;

/// Role ids actually attached and detached by one sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSyncOutcome {
    /// Scope the sync was applied to.
    pub scope: Scope,
    /// Roles newly granted in the scope.
    pub attached: BTreeSet<RoleId>,
    /// Roles revoked from the scope.
    pub detached: BTreeSet<RoleId>,
}

/// Attach/detach plan reconciling current roles to desired roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleDiff {
    /// `desired - current`.
    pub to_attach: BTreeSet<RoleId>,
    /// `current - desired`.
    pub to_detach: BTreeSet<RoleId>,
}

impl RoleDiff {
    /// Computes the plan for one scope.
    #[must_use]
    pub fn between(current: &BTreeSet<RoleId>, desired: &BTreeSet<RoleId>) -> Self {
        Self {
            to_attach: desired.difference(current).copied().collect(),
            to_detach: current.difference(desired).copied().collect(),
        }
    }

    /// Returns whether the plan changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_attach.is_empty() && self.to_detach.is_empty()
    }
}

/// Reconciles a user's roles for exactly one scope.
#[derive(Clone)]
pub struct RoleSyncEngine {
    assignments: Arc<dyn AssignmentRepository>,
}

impl RoleSyncEngine {
    /// Creates an engine over the assignment store.
    #[must_use]
    pub fn new(assignments: Arc<dyn AssignmentRepository>) -> Self {
        Self { assignments }
    }

    /// Makes the roles stored with exactly `(organization_id, branch_id)` equal
    /// `desired_role_ids`.
    ///
    /// The scope is validated before the store is touched. The diff is read and
    /// applied inside one store transaction: either every attach and detach
    /// commits, or none does.
    pub async fn sync_roles(
        &self,
        user_id: UserId,
        desired_role_ids: &BTreeSet<RoleId>,
        organization_id: Option<OrganizationId>,
        branch_id: Option<BranchId>,
    ) -> AppResult<RoleSyncOutcome> {
        let scope = Scope::from_parts(organization_id, branch_id)?;
        self.sync_scope(user_id, desired_role_ids, scope).await
    }

    /// Same as [`RoleSyncEngine::sync_roles`] for an already validated scope.
    pub async fn sync_scope(
        &self,
        user_id: UserId,
        desired_role_ids: &BTreeSet<RoleId>,
        scope: Scope,
    ) -> AppResult<RoleSyncOutcome> {
        let mut transaction = self.assignments.begin_scope_sync(user_id, scope).await?;

        let current = transaction.current_role_ids().await?;
        let diff = RoleDiff::between(&current, desired_role_ids);

        let mut attached = BTreeSet::new();
        for role_id in &diff.to_attach {
            if transaction.attach_role(*role_id).await? {
                attached.insert(*role_id);
            } else {
                debug!(%user_id, %role_id, %scope, "role already attached");
            }
        }

        let mut detached = BTreeSet::new();
        for role_id in &diff.to_detach {
            if transaction.detach_role(*role_id).await? > 0 {
                detached.insert(*role_id);
            }
        }

        transaction.commit().await?;

        if !diff.is_empty() {
            info!(
                %user_id,
                %scope,
                attached = attached.len(),
                detached = detached.len(),
                "synchronized user roles"
            );
        }

        Ok(RoleSyncOutcome {
            scope,
            attached,
            detached,
        })
    }
}
